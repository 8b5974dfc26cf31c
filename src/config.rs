// SPDX-License-Identifier: MIT

//! Client configuration.
//!
//! Constructed programmatically in most cases; `from_env()` exists for
//! tools that keep their credentials in the environment or a `.env` file.

use std::env;
use std::time::Duration;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.joinsaturn.net/api/v2";

/// Default interval between credential refresh cycles (2 hours).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Construction parameters for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every authenticated request.
    pub access_token: String,
    /// Token exchanged for a fresh pair on each refresh cycle.
    pub refresh_token: String,
    /// Sleep between refresh cycles. Must be positive.
    pub refresh_interval: Duration,
    /// API base URL; overridable so tests can point at a local server.
    pub api_base_url: String,
}

impl ClientConfig {
    /// Create a config with the default refresh interval and base URL.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set the refresh interval from a duration.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the refresh interval from raw seconds.
    pub fn refresh_interval_secs(mut self, secs: f64) -> Self {
        self.refresh_interval = Duration::from_secs_f64(secs.max(0.0));
        self
    }

    /// Override the API base URL.
    pub fn api_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = base.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `SATURN_ACCESS_TOKEN` and `SATURN_REFRESH_TOKEN` (required),
    /// `SATURN_REFRESH_INTERVAL_SECS` and `SATURN_API_BASE` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let access_token = env::var("SATURN_ACCESS_TOKEN")
            .map_err(|_| ConfigError::Missing("SATURN_ACCESS_TOKEN"))?;
        let refresh_token = env::var("SATURN_REFRESH_TOKEN")
            .map_err(|_| ConfigError::Missing("SATURN_REFRESH_TOKEN"))?;

        let mut config = Self::new(access_token, refresh_token);

        if let Ok(secs) = env::var("SATURN_REFRESH_INTERVAL_SECS") {
            let secs: f64 = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("SATURN_REFRESH_INTERVAL_SECS"))?;
            config = config.refresh_interval_secs(secs);
        }
        if let Ok(base) = env::var("SATURN_API_BASE") {
            config = config.api_base_url(base);
        }

        Ok(config)
    }

    /// Check the invariants the runtime relies on.
    pub(crate) fn validate(&self) -> Result<(), crate::Error> {
        if self.access_token.is_empty() {
            return Err(crate::Error::Config("access token is empty".into()));
        }
        if self.refresh_token.is_empty() {
            return Err(crate::Error::Config("refresh token is empty".into()));
        }
        if self.refresh_interval.is_zero() {
            return Err(crate::Error::Config(
                "refresh interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Unparseable environment variable: {0}")]
    Invalid(&'static str),
}
