//! Sync layer configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend address
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";

/// Fixed delay between an unexpected disconnect and the next attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("unsupported server URL scheme '{0}' (expected ws, wss, http or https)")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the backend; the channel lives at `{server_url}/ws/{conversation_id}`
    pub server_url: Url,
    /// Delay before reconnecting after a close
    pub reconnect_delay: Duration,
}

impl SyncConfig {
    pub fn new(server_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(server_url).map_err(|e| ConfigError::InvalidServerUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "ws" | "wss" | "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidServerUrl {
                url: server_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            server_url: url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL)
                .unwrap_or_else(|e| unreachable!("default server URL is valid: {e}")),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}
