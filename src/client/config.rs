
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::time::Duration;

/// Default list backend URL
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Resolved client configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_app(app: AppConfig) -> Result<Self, ConfigError> {
        app.validate()?;
        Ok(Self { app })
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    /// Defaults, config file, then `FLIXLIST_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self { app: AppConfig::load()? })
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }

    pub fn api_base(&self) -> &str {
        self.app.list_api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    pub fn user_agent(&self) -> String {
        self.app
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("flixlist/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}
