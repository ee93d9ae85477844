//! Server configuration.
//!
//! Read from the environment (after loading `.env`), then overridden by CLI
//! flags in `main`.
//!
//! | Variable                    | Default   |
//! |-----------------------------|-----------|
//! | `PSMTABLE_HOST`             | `0.0.0.0` |
//! | `PSMTABLE_PORT`             | `3000`    |
//! | `PSMTABLE_MAX_UPLOAD_BYTES` | 10 MiB    |

use std::env;
use std::net::SocketAddr;

use tracing::warn;

use crate::error::{ServerError, ServerResult};

pub const HOST_VAR: &str = "PSMTABLE_HOST";
pub const PORT_VAR: &str = "PSMTABLE_PORT";
pub const MAX_UPLOAD_VAR: &str = "PSMTABLE_MAX_UPLOAD_BYTES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body cap for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load `.env` if present and read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(raw) = lookup(PORT_VAR) {
            match raw.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid {}={:?}", PORT_VAR, raw),
            }
        }
        if let Some(raw) = lookup(MAX_UPLOAD_VAR) {
            match raw.trim().parse() {
                Ok(bytes) => config.max_upload_bytes = bytes,
                Err(_) => warn!("Ignoring invalid {}={:?}", MAX_UPLOAD_VAR, raw),
            }
        }

        config
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        self
    }

    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::BadRequest(format!("Invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            (HOST_VAR, "127.0.0.1"),
            (PORT_VAR, " 8081 "),
            (MAX_UPLOAD_VAR, "1024"),
        ]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8081);
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "http"), (MAX_UPLOAD_VAR, "-1")]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_cli_overrides() {
        let config = ServerConfig::default()
            .with_port(Some(9090))
            .with_host(None);
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_bad_bind_address() {
        let config = ServerConfig::default().with_host(Some("not a host".into()));
        assert!(config.socket_addr().is_err());
    }
}
