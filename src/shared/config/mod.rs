//! Application configuration module
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (`~/.config/attendsync/config.toml`, or the path in `ATTENDSYNC_CONFIG`),
//! then environment variables. Later layers win.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Default per-request timeout for plain request/response calls.
///
/// The progress stream is exempt: a sync may legitimately run for a long
/// time and no client-side timeout is enforced on it.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the API base URL
const ENV_API_URL: &str = "ATTENDSYNC_API_URL";
/// Environment variable overriding the request timeout
const ENV_TIMEOUT_SECS: &str = "ATTENDSYNC_TIMEOUT_SECS";
/// Environment variable pointing at an explicit config file
const ENV_CONFIG_PATH: &str = "ATTENDSYNC_CONFIG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the platform API
    pub server_url: String,
    /// Timeout in seconds for plain request/response calls
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the default layers: built-in defaults, then
    /// the config file if one exists, then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file, on top of defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        let mut config = Self::default();
        if let Some(url) = file.server_url {
            config.server_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides in place
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.server_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs =
                raw.parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                    name: ENV_TIMEOUT_SECS,
                    message: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::MissingValue("server_url"));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl AppConfigBuilder {
    /// Set the API base URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self.server_url.unwrap_or(defaults.server_url),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Shape of the optional TOML config file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Resolve the config file path: `ATTENDSYNC_CONFIG` wins, otherwise the
/// platform config directory.
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("attendsync").join("config.toml"))
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
    #[error("unreadable config file {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("invalid config file {path}: {message}")]
    Parse { path: String, message: String },
}
