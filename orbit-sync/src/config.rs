//! Server configuration, with environment overrides.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API bind address
    pub http_addr: String,
    /// WebSocket event channel bind address
    pub ws_addr: String,
    /// Store directory (None = in-memory only)
    pub storage_path: Option<PathBuf>,
    /// Frames queued per subscriber before drops
    pub broadcast_capacity: usize,
    /// Server ping interval in seconds
    pub heartbeat_interval_secs: u64,
    /// Close connections silent for this long
    pub client_timeout_secs: u64,
    /// Max HTTP request body
    pub max_body_bytes: usize,
    /// Shared bearer token; None disables the check
    pub auth_token: Option<String>,
    /// External capture program and args
    pub capture_command: Option<String>,
    pub capture_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:5000".to_string(),
            ws_addr: "127.0.0.1:5001".to_string(),
            storage_path: Some(PathBuf::from("orbit_data")),
            broadcast_capacity: 256,
            heartbeat_interval_secs: 25,
            client_timeout_secs: 60,
            max_body_bytes: 100_000_000,
            auth_token: None,
            capture_command: None,
            capture_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// In-memory store, ephemeral ports.
    pub fn for_testing() -> Self {
        Self {
            http_addr: "127.0.0.1:0".to_string(),
            ws_addr: "127.0.0.1:0".to_string(),
            storage_path: None,
            broadcast_capacity: 64,
            ..Self::default()
        }
    }

    /// Defaults overridden by `ORBIT_*` variables (and `PORT`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            let port: u16 = parse("PORT", port)?;
            config.http_addr = format!("0.0.0.0:{port}");
        }
        if let Some(addr) = lookup("ORBIT_HTTP_ADDR") {
            config.http_addr = addr;
        }
        if let Some(addr) = lookup("ORBIT_WS_ADDR") {
            config.ws_addr = addr;
        }
        if let Some(dir) = lookup("ORBIT_DATA_DIR") {
            config.storage_path = match dir.as_str() {
                "" | ":memory:" => None,
                _ => Some(PathBuf::from(dir)),
            };
        }
        if let Some(v) = lookup("ORBIT_BROADCAST_CAPACITY") {
            config.broadcast_capacity = parse("ORBIT_BROADCAST_CAPACITY", v)?;
        }
        if let Some(v) = lookup("ORBIT_HEARTBEAT_SECS") {
            config.heartbeat_interval_secs = parse("ORBIT_HEARTBEAT_SECS", v)?;
        }
        if let Some(v) = lookup("ORBIT_CLIENT_TIMEOUT_SECS") {
            config.client_timeout_secs = parse("ORBIT_CLIENT_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("ORBIT_MAX_BODY_BYTES") {
            config.max_body_bytes = parse("ORBIT_MAX_BODY_BYTES", v)?;
        }
        config.auth_token = lookup("ORBIT_AUTH_TOKEN").filter(|t| !t.is_empty());
        config.capture_command = lookup("ORBIT_CAPTURE_COMMAND").filter(|c| !c.trim().is_empty());
        if let Some(v) = lookup("ORBIT_CAPTURE_TIMEOUT_SECS") {
            config.capture_timeout_secs = parse("ORBIT_CAPTURE_TIMEOUT_SECS", v)?;
        }

        Ok(config)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs.max(1))
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs.max(1))
    }
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
