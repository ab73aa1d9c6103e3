//! # Container
//!
//! Configuration for every subsystem the runtime wires together.

pub mod config;

pub use config::{ConfigError, NetworkConfig, NodeConfig, ENV_PREFIX, MIRROR_FILE};
