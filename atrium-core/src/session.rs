//! Session collaborator - supplies the opaque bearer credential
//!
//! Authentication itself is out of scope; by the time any core operation
//! runs the caller is already authenticated. The core only needs a token to
//! attach to backend requests, so the seam is a single async getter.

use async_trait::async_trait;

use crate::api::ApiError;

/// Supplies the bearer credential for backend calls
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current bearer token, or [`ApiError::Unauthenticated`] when the
    /// session cannot produce one
    async fn bearer_token(&self) -> Result<String, ApiError>;
}

/// A fixed token, handed over at construction
pub struct StaticSession {
    token: String,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn bearer_token(&self) -> Result<String, ApiError> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call
///
/// The variable name is configuration, so deployments can point different
/// processes at different credentials without code changes.
pub struct EnvSession {
    var: String,
}

impl EnvSession {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SessionProvider for EnvSession {
    async fn bearer_token(&self) -> Result<String, ApiError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_session() {
        let session = StaticSession::new("tok-1");
        assert_eq!(session.bearer_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn test_env_session_missing() {
        let session = EnvSession::new("ATRIUM_TEST_TOKEN_THAT_DOES_NOT_EXIST");
        assert!(matches!(
            session.bearer_token().await,
            Err(ApiError::Unauthenticated)
        ));
    }
}
