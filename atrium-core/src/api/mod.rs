//! Backend API layer
//!
//! Each backend host gets a trait (so components depend on a seam, not on
//! HTTP) plus a reqwest implementation:
//! - [`console::ConsoleApi`]: the workspace console (publish, catalog,
//!   imports, installed apps)
//! - [`billing::BillingApi`]: the billing service (usage pricing, profile)
//!
//! No call is retried automatically; failures surface as [`ApiError`] as
//! soon as the underlying request rejects.

pub mod billing;
pub mod console;

use std::time::Duration;
use thiserror::Error;

/// Request timeout applied to every backend client
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced by the backend API layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connect, timeout, body, decode)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// No bearer credential was available for the call
    #[error("no session credential available")]
    Unauthenticated,

    /// The server answered 2xx but the payload violated the contract
    #[error("malformed response from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },
}

/// Build the shared HTTP client used by the backend implementations
pub(crate) fn http_client() -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("atrium/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Map a non-success response to [`ApiError::Status`], keeping the body for
/// diagnostics
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let endpoint = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        endpoint,
        status,
        body,
    })
}

/// Strip a trailing slash so endpoint joins stay predictable
pub(crate) fn normalize_base_url(base_url: impl Into<String>) -> String {
    let mut base_url = base_url.into();
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
