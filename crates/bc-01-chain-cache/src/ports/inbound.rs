//! # Inbound Ports (Driving Ports)
//!
//! The API the runtime's block handler drives once the cache is initialized.

use crate::domain::errors::ChainCacheError;
use shared_types::{BlockHeader, ChainSnapshot};
use std::sync::Arc;

/// Primary API for the Chain Cache subsystem.
pub trait ChainCacheApi: Send {
    /// Stamp `header` with the local receive time, insert it, evict down to
    /// capacity and rewrite the mirror.
    ///
    /// On success the mirror holds exactly the returned snapshot.
    ///
    /// ## Errors
    ///
    /// - `Persist`: the mirror could not be rewritten. The in-memory cache
    ///   is left unchanged.
    fn add_block(&mut self, header: BlockHeader) -> Result<Arc<ChainSnapshot>, ChainCacheError>;

    /// Re-read the mirror and compare it with the in-memory cache.
    ///
    /// ## Errors
    ///
    /// - `IntegrityMismatch`: contents differ
    /// - `CorruptMirror` / `Persist`: the mirror could not be read
    fn check_integrity(&self) -> Result<(), ChainCacheError>;

    /// Current contents.
    fn snapshot(&self) -> Arc<ChainSnapshot>;
}
