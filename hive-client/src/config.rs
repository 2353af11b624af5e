//! Client configuration.
//!
//! Built-in defaults, optionally overlaid by a TOML file, then by the
//! `ASKHIVE_API_URL` / `ASKHIVE_WS_URL` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use askhive_core::ReconnectPolicy;
use reqwest::Url;
use serde::Deserialize;

/// Environment variable overriding the HTTP origin.
pub const API_URL_ENV: &str = "ASKHIVE_API_URL";
/// Environment variable overriding the persistent-connection URL.
pub const WS_URL_ENV: &str = "ASKHIVE_WS_URL";

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Server endpoints.
    #[serde(default)]
    pub server: ServerConfig,
    /// Live feed timing.
    #[serde(default)]
    pub live: LiveConfig,
    /// Reconnect backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Server endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// HTTP origin for the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Persistent-connection URL, without the token.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

/// Live feed timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveConfig {
    /// Seconds between heartbeat pings.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Seconds between fetches when polling instead of holding a connection.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconnectConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,
    /// Growth factor per attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    /// Upper bound on one delay in milliseconds.
    #[serde(default = "default_cap_ms")]
    pub cap_ms: u64,
    /// Attempts before giving up; 0 disables reconnecting.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_poll_secs() -> u64 {
    5
}

fn default_base_ms() -> u64 {
    ReconnectPolicy::DEFAULT_BASE.as_millis() as u64
}

fn default_multiplier() -> u32 {
    ReconnectPolicy::DEFAULT_MULTIPLIER
}

fn default_cap_ms() -> u64 {
    ReconnectPolicy::DEFAULT_CAP.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    ReconnectPolicy::DEFAULT_MAX_ATTEMPTS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            poll_secs: default_poll_secs(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_ms: default_base_ms(),
            multiplier: default_multiplier(),
            cap_ms: default_cap_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// period is zero.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the timers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live.heartbeat_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "live.heartbeat_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.live.poll_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "live.poll_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults or `path`, with environment overrides applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(WS_URL_ENV).ok(),
        ))
    }

    /// Replace the endpoints that are given; empty strings are ignored.
    pub fn with_overrides(mut self, api_url: Option<String>, ws_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.server.api_url = url;
        }
        if let Some(url) = ws_url.filter(|u| !u.is_empty()) {
            self.server.ws_url = url;
        }
        self
    }

    /// HTTP origin.
    pub fn api_url(&self) -> &str {
        &self.server.api_url
    }

    /// Heartbeat period, never shorter than one second.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.live.heartbeat_secs.max(1))
    }

    /// Polling period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.live.poll_secs.max(1))
    }

    /// Reconnect policy built from the `[reconnect]` section.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect.base_ms),
            self.reconnect.multiplier,
            Duration::from_millis(self.reconnect.cap_ms),
            self.reconnect.max_attempts,
        )
    }

    /// Persistent-connection URL, with `?token=` appended when signed in.
    pub fn ws_endpoint(&self, token: Option<&str>) -> Result<String, ConfigError> {
        let mut url = Url::parse(&self.server.ws_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.server.ws_url.clone(),
            reason: e.to_string(),
        })?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url.to_string())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A configured URL does not parse.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// The offending value.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// A setting is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Dotted key of the setting.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
