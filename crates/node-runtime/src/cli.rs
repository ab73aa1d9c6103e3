//! Command-line interface.

use crate::container::{ConfigError, NodeConfig};
use bc_03_feed::FeedBackend;
use clap::Parser;
use std::path::PathBuf;

/// Live block clock server.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "blockclock", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Follow a local regtest node
    #[arg(long)]
    pub test: bool,

    /// Delete the block mirror and backfill from the node
    #[arg(long)]
    pub reset: bool,

    /// Node backend: bitcoind or push
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<FeedBackend>,

    /// HTTP/WebSocket port
    #[arg(long, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Directory holding the block mirror
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory of static client files
    #[arg(long, value_name = "DIR")]
    pub html_dir: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// One JSON object per log line
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn load_config(&self) -> Result<NodeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };
        config.apply_env()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply the flags that were given.
    pub fn apply(&self, config: &mut NodeConfig) {
        if self.test {
            config.network.test = true;
        }
        if self.reset {
            config.cache.reset = true;
        }
        if let Some(backend) = self.backend {
            config.feed.backend = backend;
        }
        if let Some(port) = self.http_port {
            config.server.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.set_data_dir(dir);
        }
        if let Some(dir) = &self.html_dir {
            config.set_html_dir(dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.telemetry.log_level = level.clone();
        }
        if self.json_logs {
            config.telemetry.json_logs = true;
        }
        config.apply_network_defaults();
    }
}
