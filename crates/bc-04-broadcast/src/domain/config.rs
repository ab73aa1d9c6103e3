//! HTTP / WebSocket server configuration.

use crate::domain::error::BroadcastError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Static client files.
    pub html_dir: PathBuf,
    /// Frames queued per connection before broadcasts to it are dropped.
    pub outbound_buffer: usize,
    /// Maximum mempool summaries sent to a new connection.
    pub catch_up_limit: usize,
    /// Close a connection after this long without a client frame.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Keep-alive interval announced in the open packet.
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50000,
            html_dir: PathBuf::from("html"),
            outbound_buffer: 256,
            catch_up_limit: 500,
            idle_timeout: Duration::from_secs(60),
            ping_interval: Duration::from_secs(25),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, BroadcastError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| BroadcastError::InvalidConfig {
                reason: format!("server.host '{}': {e}", self.host),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn validate(&self) -> Result<(), BroadcastError> {
        self.socket_addr()?;
        let invalid = |reason: &str| BroadcastError::InvalidConfig {
            reason: reason.to_string(),
        };
        if self.outbound_buffer == 0 {
            return Err(invalid("server.outbound_buffer must be at least 1"));
        }
        if self.idle_timeout <= self.ping_interval {
            return Err(invalid("server.idle_timeout must exceed server.ping_interval"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:50000");
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_buffer = ServerConfig {
            outbound_buffer: 0,
            ..ServerConfig::default()
        };
        assert!(zero_buffer.validate().is_err());

        let bad_host = ServerConfig {
            host: "localhost:80".into(),
            ..ServerConfig::default()
        };
        assert!(bad_host.validate().is_err());

        let short_idle = ServerConfig {
            idle_timeout: Duration::from_secs(10),
            ..ServerConfig::default()
        };
        assert!(short_idle.validate().is_err());
    }
}
