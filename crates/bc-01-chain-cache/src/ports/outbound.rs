//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the Chain Cache service.

use crate::domain::errors::{HeaderSourceError, MirrorError};
use async_trait::async_trait;
use shared_types::{BlockHeader, ChainSnapshot};

/// Durable copy of the cache contents.
///
/// Production: `JsonFileMirror`
/// Testing: `InMemoryMirror`
pub trait MirrorStore: Send + Sync {
    /// Load the stored snapshot. `Ok(None)` when nothing has been stored.
    fn load(&self) -> Result<Option<ChainSnapshot>, MirrorError>;

    /// Replace the stored snapshot. Readers never observe a partial write.
    fn store(&mut self, snapshot: &ChainSnapshot) -> Result<(), MirrorError>;

    /// Delete the stored snapshot. Returns whether anything was removed.
    fn remove(&mut self) -> Result<bool, MirrorError>;

    /// Human-readable location for logs and errors.
    fn location(&self) -> String;
}

/// Source of historical headers, used for cold-start backfill.
#[async_trait]
pub trait HeaderSource: Send + Sync {
    /// Height of the node's best block.
    async fn current_height(&self) -> Result<u64, HeaderSourceError>;

    /// Header of the best-chain block at `height`.
    async fn header_at(&self, height: u64) -> Result<BlockHeader, HeaderSourceError>;
}

/// Wall clock, in unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}
