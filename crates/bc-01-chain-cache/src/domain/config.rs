//! Chain cache configuration.

use crate::domain::chain::DEFAULT_CAPACITY;
use crate::domain::errors::ChainCacheError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the chain cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of recent blocks kept.
    pub capacity: usize,
    /// Location of the mirror file.
    pub mirror_path: PathBuf,
    /// Delete the mirror at startup, forcing a backfill from the node.
    pub reset: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            mirror_path: PathBuf::from("html/blocks.json"),
            reset: false,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ChainCacheError> {
        if self.capacity == 0 {
            return Err(ChainCacheError::InvalidConfig {
                reason: "cache.capacity must be at least 1".to_string(),
            });
        }
        if self.mirror_path.as_os_str().is_empty() {
            return Err(ChainCacheError::InvalidConfig {
                reason: "cache.mirror_path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
