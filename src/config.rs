use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when the bot token is not configured
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no bot token configured; set TELEGRAM_BOT_TOKEN or bot.token")]
    MissingToken,
}

/// Configuration for the pagination walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Timeout applied to every page request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of pages fetched by a single search
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// User agent sent with page requests (the HTTP client default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Configuration for the Telegram front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token; falls back to the environment when empty
    #[serde(default)]
    pub token: String,

    /// Long-poll timeout passed to `getUpdates`, in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Base URL of the Bot API
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// Complete application configuration as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub bot: BotConfig,
}

/// Default value for request_timeout_secs
fn default_request_timeout_secs() -> u64 {
    30
}

/// Default value for max_pages
fn default_max_pages() -> usize {
    500
}

/// Default value for poll_timeout_secs
fn default_poll_timeout_secs() -> u64 {
    25
}

/// Default value for api_base
fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_pages: default_max_pages(),
            user_agent: None,
        }
    }
}

impl SearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

impl BotConfig {
    /// Returns the configured token, or the one from the environment
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        let token = if self.token.trim().is_empty() {
            std::env::var(TOKEN_ENV).unwrap_or_default()
        } else {
            self.token.clone()
        };

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(token)
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }
}
