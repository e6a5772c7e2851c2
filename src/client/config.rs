use std::time::Duration;

use tracing::warn;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, DEFAULT_SERVER_URL};

/// Client configuration wrapper.
///
/// Wraps the shared [`AppConfig`] and adds client-only state such as the
/// session token used for authenticated endpoints.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let server_url = std::env::var("ATTENDSYNC_API_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let app = AppConfig::builder()
            .server_url(server_url.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    "[Config] Ignoring invalid ATTENDSYNC_API_URL {:?}: {}",
                    server_url, e
                );
                AppConfig::default()
            });
        Self { app, token: None }
    }
}

impl Config {
    /// Create a new configuration with default values.
    ///
    /// The server URL comes from `ATTENDSYNC_API_URL` when set; a value
    /// that fails validation is ignored with a warning and the default
    /// URL is used instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already loaded application configuration
    pub fn from_app(app: AppConfig) -> Self {
        Self { app, token: None }
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    /// Timeout applied to plain request/response calls.
    ///
    /// Never applied to the progress stream, which stays open for as long
    /// as the server keeps sending events.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }
}
