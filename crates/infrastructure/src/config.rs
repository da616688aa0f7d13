//! Client configuration.
//!
//! Values come from, lowest precedence first: built-in defaults, an optional
//! `ecoroute.toml`, and `ECOROUTE_*` environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::adapters::DEFAULT_TIMEOUT_MS;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ECOROUTE";
/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "ecoroute.toml";
/// API used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the API client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API.
    pub api_base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Consecutive refresh failures before the session is dropped.
    pub max_refresh_failures: u32,
    /// Fraction of the token lifetime at which it is refreshed.
    pub refresh_threshold: f64,
    /// Directory holding the session files.
    pub session_dir: PathBuf,
    /// Map tile provider token, passed through to map front ends.
    pub map_token: Option<String>,
    /// OAuth client id, passed through to sign-in front ends.
    pub oauth_client_id: Option<String>,
    /// Push notification app id, passed through to front ends.
    pub notification_app_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_refresh_failures: ecoroute_application::auth::DEFAULT_MAX_REFRESH_FAILURES,
            refresh_threshold: ecoroute_application::auth::DEFAULT_REFRESH_THRESHOLD,
            session_dir: default_session_dir(),
            map_token: None,
            oauth_client_id: None,
            notification_app_id: None,
        }
    }
}

/// `<data dir>/ecoroute`, or `./.ecoroute` when the platform has none.
#[must_use]
pub fn default_session_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".ecoroute"), |dir| dir.join("ecoroute"))
}

impl ClientConfig {
    /// Loads `ecoroute.toml` from the working directory if present, then
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some(Path::new(CONFIG_FILE)))
    }

    /// Loads from an optional file, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value is invalid.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        tracing::debug!(api_base_url = %config.api_base_url, "Configuration loaded");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::Invalid(format!("api_base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_refresh_failures == 0 {
            return Err(ConfigError::Invalid(
                "max_refresh_failures must be at least 1".to_string(),
            ));
        }
        if !(self.refresh_threshold > 0.0 && self.refresh_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "refresh_threshold must be in (0, 1], got {}",
                self.refresh_threshold
            )));
        }
        Ok(())
    }
}
