//! # Domain Layer
//!
//! Pure domain logic for the Chain Cache subsystem.

pub mod chain;
pub mod config;
pub mod errors;

pub use chain::{backfill_range, BoundedChain, Insertion, DEFAULT_CAPACITY};
pub use config::CacheConfig;
pub use errors::{ChainCacheError, HeaderSourceError, MirrorError};
