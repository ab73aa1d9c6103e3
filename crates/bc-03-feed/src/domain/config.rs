//! Feed configuration.

use crate::domain::error::FeedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Mainnet RPC port.
pub const MAINNET_RPC_PORT: u16 = 8332;
/// Regtest RPC port, selected by `--test`.
pub const REGTEST_RPC_PORT: u16 = 18443;

/// Which node backend supplies blocks and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedBackend {
    /// bitcoind JSON-RPC over HTTP plus ZMQ notifications.
    #[default]
    Bitcoind,
    /// One WebSocket carrying JSON-RPC calls and pushed notifications.
    Push,
}

impl fmt::Display for FeedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitcoind => f.write_str("bitcoind"),
            Self::Push => f.write_str("push"),
        }
    }
}

impl FromStr for FeedBackend {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoind" => Ok(Self::Bitcoind),
            "push" => Ok(Self::Push),
            other => Err(FeedError::InvalidConfig {
                reason: format!("unknown feed backend '{other}' (expected bitcoind or push)"),
            }),
        }
    }
}

/// Connection settings for the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub backend: FeedBackend,
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    /// Cookie file written by the node. Takes precedence over user/password.
    pub rpc_cookie: Option<PathBuf>,
    pub zmq_endpoint: String,
    /// Subscribe to `rawtx` and decode locally instead of `hashtx` + lookup.
    pub raw_tx: bool,
    pub push_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            backend: FeedBackend::Bitcoind,
            rpc_url: format!("http://127.0.0.1:{MAINNET_RPC_PORT}"),
            rpc_user: "blockclock".to_string(),
            rpc_password: String::new(),
            rpc_cookie: None,
            zmq_endpoint: "tcp://127.0.0.1:21000".to_string(),
            raw_tx: false,
            push_url: "ws://127.0.0.1:8080/ws".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl FeedConfig {
    /// Defaults for a local regtest node.
    #[must_use]
    pub fn regtest() -> Self {
        Self {
            rpc_url: format!("http://127.0.0.1:{REGTEST_RPC_PORT}"),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        let invalid = |reason: &str| FeedError::InvalidConfig {
            reason: reason.to_string(),
        };
        match self.backend {
            FeedBackend::Bitcoind => {
                if self.rpc_url.trim().is_empty() {
                    return Err(invalid("feed.rpc_url must not be empty"));
                }
                if self.zmq_endpoint.trim().is_empty() {
                    return Err(invalid("feed.zmq_endpoint must not be empty"));
                }
            }
            FeedBackend::Push => {
                if self.push_url.trim().is_empty() {
                    return Err(invalid("feed.push_url must not be empty"));
                }
            }
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("feed.request_timeout must be positive"));
        }
        Ok(())
    }
}
