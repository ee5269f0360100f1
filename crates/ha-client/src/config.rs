//! Client configuration
//!
//! Configuration can come from code, environment variables or a YAML file:
//!
//! ```yaml
//! url: http://homeassistant.local:8123
//! token: <long-lived access token>
//! timeout: 30            # seconds, REST requests
//! handshake_timeout: 10  # seconds, WebSocket dial
//! ```

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HaError, HaResult};

/// Default timeout for REST requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the WebSocket dial
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings shared by the REST and WebSocket clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Home Assistant instance, without trailing slash
    pub base_url: String,
    /// Long-lived access token
    pub token: String,
    /// Timeout applied to every REST request
    pub timeout: Duration,
    /// Bound on the WebSocket dial, independent of any caller deadline
    pub handshake_timeout: Duration,
}

/// On-disk shape of the YAML config file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    url: Option<String>,
    token: Option<String>,
    timeout: Option<u64>,
    handshake_timeout: Option<u64>,
}

impl ClientConfig {
    /// Create a config with default timeouts
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Set the REST request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the WebSocket dial bound
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Load configuration from `HA_URL`, `HA_TOKEN` and `HA_TIMEOUT`
    pub fn from_env() -> HaResult<Self> {
        let base_url = env::var("HA_URL").unwrap_or_default();
        let token = env::var("HA_TOKEN").unwrap_or_default();
        let mut config = Self::new(base_url, token);

        if let Ok(raw) = env::var("HA_TIMEOUT") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| HaError::Config(format!("HA_TIMEOUT is not a number: {}", raw)))?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> HaResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading client config");

        let content = std::fs::read_to_string(path).map_err(|e| {
            HaError::Config(format!("failed to read file {}: {}", path.display(), e))
        })?;
        let file: ConfigFile = serde_yaml::from_str(&content).map_err(|e| {
            HaError::Config(format!("failed to parse YAML in {}: {}", path.display(), e))
        })?;

        let mut config = Self::new(
            file.url.unwrap_or_default(),
            file.token.unwrap_or_default(),
        );
        if let Some(secs) = file.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.handshake_timeout {
            config.handshake_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the required fields are set
    pub fn validate(&self) -> HaResult<()> {
        if self.base_url.is_empty() {
            return Err(HaError::MissingBaseUrl);
        }
        if self.token.is_empty() {
            return Err(HaError::MissingToken);
        }
        Ok(())
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
