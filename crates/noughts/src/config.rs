//! Server configuration.
//!
//! Loaded from environment variables; every value has a default so the
//! server starts with no configuration at all.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default idle timeout in seconds. Zero disables it: a player waiting for
/// an opponent sends nothing for as long as the wait lasts.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 0;

/// Noughts server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind (default: "0.0.0.0").
    pub host: String,

    /// Port to bind (default: 3000).
    pub port: u16,

    /// Close a connection after this long without an inbound frame.
    /// `None` disables the timeout.
    pub idle_timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars
            .get("NOUGHTS_HOST")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_HOST)
            .to_string();

        let port = parse_or("PORT", vars, DEFAULT_PORT)?;

        let idle_secs = parse_or("NOUGHTS_IDLE_TIMEOUT_SECS", vars, DEFAULT_IDLE_TIMEOUT_SECS)?;
        let idle_timeout = idle_timeout_from_secs(idle_secs);

        Ok(Self {
            host,
            port,
            idle_timeout,
        })
    }

    /// `host:port`, ready for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: idle_timeout_from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

fn idle_timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    vars: &HashMap<String, String>,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
        }),
    }
}
