//! Application configuration module
//!
//! Provides configuration types for the list client. Values are layered:
//! built-in defaults, then an optional TOML file, then environment variables.
//!
//! ```toml
//! list_api_url = "https://example.com/api"
//! request_timeout_secs = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the list backend base URL
pub const ENV_API_URL: &str = "FLIXLIST_API_URL";
/// Environment variable overriding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "FLIXLIST_TIMEOUT_SECS";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the list backend, e.g. `https://host/api`
    pub list_api_url: Option<String>,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            list_api_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.list_api_url {
            validate_url(url)?;
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Default config file location (`<config dir>/flixlist/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flixlist").join("config.toml"))
    }

    /// Load defaults, the default config file if it exists, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(path)?
            }
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Apply `FLIXLIST_*` environment overrides on top of this config
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let mut builder = AppConfigBuilder::from(self);
        if let Ok(url) = std::env::var(ENV_API_URL) {
            builder = builder.list_api_url(url);
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "request_timeout_secs",
                message: format!("'{}' is not a number of seconds", raw),
            })?;
            builder = builder.request_timeout_secs(secs);
        }
        builder.build()
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    list_api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl From<AppConfig> for AppConfigBuilder {
    fn from(config: AppConfig) -> Self {
        Self {
            list_api_url: config.list_api_url,
            request_timeout_secs: Some(config.request_timeout_secs),
            user_agent: config.user_agent,
        }
    }
}

impl AppConfigBuilder {
    /// Set the list backend URL
    pub fn list_api_url(mut self, url: impl Into<String>) -> Self {
        self.list_api_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            list_api_url: self
                .list_api_url
                .map(|url| url.trim_end_matches('/').to_string()),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            user_agent: self.user_agent,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}
