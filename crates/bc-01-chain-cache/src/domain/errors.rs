//! # Domain Errors
//!
//! Error types for the Chain Cache subsystem.
//!
//! ## Design Principles
//!
//! - Persistence failures are never swallowed: the cache and its mirror
//!   must not silently diverge
//! - Errors are descriptive and actionable

use thiserror::Error;

/// Errors that can occur during chain cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainCacheError {
    /// Capacity of zero or a similarly unusable configuration.
    #[error("invalid cache configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The mirror file exists but cannot be parsed.
    #[error("mirror at {location} is corrupt: {message}")]
    CorruptMirror { location: String, message: String },

    /// The mirror could not be read or written.
    #[error("mirror persistence failed: {0}")]
    Persist(#[from] MirrorError),

    /// The node could not supply a header during cold-start backfill.
    #[error("backfill failed at height {height}: {source}")]
    Backfill {
        height: u64,
        #[source]
        source: HeaderSourceError,
    },

    /// The node could not report its current height.
    #[error("could not query current height: {0}")]
    Tip(#[source] HeaderSourceError),

    /// The mirror does not hold exactly what the cache holds.
    #[error(
        "mirror diverged from cache: missing {missing:?}, unexpected {unexpected:?}, differing {differing:?}"
    )]
    IntegrityMismatch {
        /// Heights cached in memory but absent from the mirror.
        missing: Vec<u64>,
        /// Heights in the mirror but not cached in memory.
        unexpected: Vec<u64>,
        /// Heights present in both with different content.
        differing: Vec<u64>,
    },
}

/// Errors reported by a mirror store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// I/O failure reading, writing or deleting the mirror.
    #[error("I/O error on {location}: {message}")]
    Io { location: String, message: String },

    /// The stored content is not a valid snapshot.
    #[error("invalid mirror content in {location}: {message}")]
    Corrupt { location: String, message: String },

    /// Serializing the snapshot failed.
    #[error("serialization failed: {message}")]
    Serialization { message: String },
}

/// Errors reported by a header source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderSourceError {
    /// The node does not know a block at this height.
    #[error("no block at height {height}")]
    NotFound { height: u64 },

    /// Transport or node failure.
    #[error("header source unavailable: {message}")]
    Unavailable { message: String },
}
