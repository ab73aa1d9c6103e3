//! # Node Configuration
//!
//! Unified configuration for every subsystem.
//!
//! ## Layering (later wins)
//!
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. `BLOCKCLOCK_*` environment variables
//! 4. Command-line flags (see `cli.rs`)

use bc_01_chain_cache::CacheConfig;
use bc_03_feed::{FeedBackend, FeedConfig};
use bc_04_broadcast::ServerConfig;
use bc_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Network, NetworkParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "BLOCKCLOCK_";

/// Name of the mirror file inside its directory.
pub const MIRROR_FILE: &str = "blocks.json";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub feed: FeedConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

/// Which chain is followed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Follow a local regtest node instead of mainnet.
    pub test: bool,
}

impl NetworkConfig {
    #[must_use]
    pub fn network(&self) -> Network {
        if self.test {
            Network::Regtest
        } else {
            Network::Bitcoin
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: {message}")]
    Env { var: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Read a TOML file. Missing sections and keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Apply `BLOCKCLOCK_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a full variable name to its
    /// value.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `BLOCKCLOCK_TEST` | `network.test` |
    /// | `BLOCKCLOCK_BACKEND` | `feed.backend` |
    /// | `BLOCKCLOCK_RPC_URL` | `feed.rpc_url` |
    /// | `BLOCKCLOCK_RPC_USER` | `feed.rpc_user` |
    /// | `BLOCKCLOCK_RPC_PASSWORD` | `feed.rpc_password` |
    /// | `BLOCKCLOCK_RPC_COOKIE` | `feed.rpc_cookie` |
    /// | `BLOCKCLOCK_ZMQ_ENDPOINT` | `feed.zmq_endpoint` |
    /// | `BLOCKCLOCK_RAW_TX` | `feed.raw_tx` |
    /// | `BLOCKCLOCK_PUSH_URL` | `feed.push_url` |
    /// | `BLOCKCLOCK_HTTP_HOST` | `server.host` |
    /// | `BLOCKCLOCK_HTTP_PORT` | `server.port` |
    /// | `BLOCKCLOCK_HTML_DIR` | `server.html_dir` |
    /// | `BLOCKCLOCK_LOG_LEVEL` | `telemetry.log_level` |
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let invalid = |name: &str, message: String| ConfigError::Env {
            var: format!("{ENV_PREFIX}{name}"),
            message,
        };

        if let Some(value) = get("TEST") {
            self.network.test = parse_flag(&value);
        }
        if let Some(value) = get("BACKEND") {
            self.feed.backend = value
                .parse::<FeedBackend>()
                .map_err(|e| invalid("BACKEND", e.to_string()))?;
        }
        if let Some(value) = get("RPC_URL") {
            self.feed.rpc_url = value;
        }
        if let Some(value) = get("RPC_USER") {
            self.feed.rpc_user = value;
        }
        if let Some(value) = get("RPC_PASSWORD") {
            self.feed.rpc_password = value;
        }
        if let Some(value) = get("RPC_COOKIE") {
            self.feed.rpc_cookie = Some(PathBuf::from(value));
        }
        if let Some(value) = get("ZMQ_ENDPOINT") {
            self.feed.zmq_endpoint = value;
        }
        if let Some(value) = get("RAW_TX") {
            self.feed.raw_tx = parse_flag(&value);
        }
        if let Some(value) = get("PUSH_URL") {
            self.feed.push_url = value;
        }
        if let Some(value) = get("HTTP_HOST") {
            self.server.host = value;
        }
        if let Some(value) = get("HTTP_PORT") {
            self.server.port = value
                .parse()
                .map_err(|e| invalid("HTTP_PORT", format!("'{value}': {e}")))?;
        }
        if let Some(value) = get("HTML_DIR") {
            self.set_html_dir(PathBuf::from(value));
        }
        if let Some(value) = get("LOG_LEVEL") {
            self.telemetry.log_level = value;
        }
        Ok(())
    }

    /// Serve static files from `dir`. A mirror still at its default location
    /// moves along with it.
    pub fn set_html_dir(&mut self, dir: PathBuf) {
        let default_mirror = CacheConfig::default().mirror_path;
        if self.cache.mirror_path == default_mirror {
            self.cache.mirror_path = dir.join(MIRROR_FILE);
        }
        self.server.html_dir = dir;
    }

    /// Keep the mirror in `dir`.
    pub fn set_data_dir(&mut self, dir: &Path) {
        self.cache.mirror_path = dir.join(MIRROR_FILE);
    }

    /// With `network.test` set, an RPC URL still at its mainnet default is
    /// switched to the regtest port.
    pub fn apply_network_defaults(&mut self) {
        if self.network.test && self.feed.rpc_url == FeedConfig::default().rpc_url {
            self.feed.rpc_url = FeedConfig::regtest().rpc_url;
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.network.network()
    }

    /// Display constants served at `/params`.
    #[must_use]
    pub fn params(&self) -> NetworkParams {
        NetworkParams::for_network(self.network())
    }

    /// Reject configurations that cannot start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.feed
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.server
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
