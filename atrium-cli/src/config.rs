//! CLI configuration
//!
//! Loaded from `config.yaml` under the user's config directory, with
//! environment overrides for the URLs and the favorites tag. The bearer
//! token itself never lives in the file; the config only names the
//! environment variable that holds it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use atrium_core::api::billing::HttpBillingApi;
use atrium_core::api::console::HttpConsoleApi;
use atrium_core::session::{EnvSession, SessionProvider};

pub const DEFAULT_CONSOLE_URL: &str = "https://console.atrium.dev/api";
pub const DEFAULT_BILLING_URL: &str = "https://billing.atrium.dev";
pub const DEFAULT_TOKEN_ENV: &str = "ATRIUM_API_TOKEN";

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the workspace console API
    #[serde(default = "default_console_url")]
    pub console_url: String,

    /// Base URL of the billing service
    #[serde(default = "default_billing_url")]
    pub billing_url: String,

    /// Tag id that marks an app as a favorite; workspace-specific
    #[serde(default)]
    pub favorite_tag_id: String,

    /// Name of the environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_console_url() -> String {
    DEFAULT_CONSOLE_URL.to_string()
}

fn default_billing_url() -> String {
    DEFAULT_BILLING_URL.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            console_url: default_console_url(),
            billing_url: default_billing_url(),
            favorite_tag_id: String::new(),
            token_env: default_token_env(),
        }
    }
}

impl CliConfig {
    /// Load from the default location, falling back to defaults when no
    /// file exists, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from_path(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific path
    pub fn load_from_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ATRIUM_CONSOLE_URL") {
            if !url.is_empty() {
                self.console_url = url;
            }
        }
        if let Ok(url) = std::env::var("ATRIUM_BILLING_URL") {
            if !url.is_empty() {
                self.billing_url = url;
            }
        }
        if let Ok(tag_id) = std::env::var("ATRIUM_FAVORITE_TAG") {
            if !tag_id.is_empty() {
                self.favorite_tag_id = tag_id;
            }
        }
    }

    /// The default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = directories::ProjectDirs::from("dev", "atrium", "atrium")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("atrium")))
            .context("Could not determine config directory")?;
        Ok(config_dir.join("config.yaml"))
    }

    pub fn session(&self) -> Arc<dyn SessionProvider> {
        Arc::new(EnvSession::new(self.token_env.clone()))
    }

    pub fn console_api(&self) -> Result<HttpConsoleApi> {
        HttpConsoleApi::new(self.console_url.clone(), self.session())
            .context("Failed to create console client")
    }

    pub fn billing_api(&self) -> Result<HttpBillingApi> {
        HttpBillingApi::new(self.billing_url.clone(), self.session())
            .context("Failed to create billing client")
    }
}
