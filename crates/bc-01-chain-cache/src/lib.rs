//! # Chain Cache (bc-01)
//!
//! Bounded store of the most recent block headers, mirrored to a JSON file.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Bounded Size | At most `capacity` (default 20) headers after every mutation |
//! | 2 | Oldest First | Eviction always removes the smallest height |
//! | 3 | Mirror Consistency | After a successful `add_block` the mirror equals the cache |
//! | 4 | Immutable Snapshots | Published snapshots are never modified afterwards |
//! | 5 | Fatal Corruption | An unparseable mirror stops startup |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Bounded chain, configuration, errors
//! - `ports/` - Inbound API and outbound mirror/header/time ports
//! - `adapters/` - JSON file and in-memory mirrors, clocks
//! - `service.rs` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use bc_01_chain_cache::{CacheConfig, ChainCacheApi, ChainCacheService, JsonFileMirror, SystemTimeSource};
//!
//! let config = CacheConfig::default();
//! let mirror = JsonFileMirror::new(&config.mirror_path);
//! let mut cache = ChainCacheService::new(config, mirror, SystemTimeSource)?;
//! cache.initialize(&node).await?;
//!
//! let snapshot = cache.add_block(header)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{FixedTimeSource, InMemoryMirror, JsonFileMirror, SystemTimeSource};
pub use domain::{
    backfill_range, BoundedChain, CacheConfig, ChainCacheError, HeaderSourceError, Insertion,
    MirrorError, DEFAULT_CAPACITY,
};
pub use ports::{ChainCacheApi, HeaderSource, MirrorStore, TimeSource};
pub use service::{ChainCacheService, InitOutcome};
