//! # Event Pump
//!
//! The long-running task that turns feed notices into cache and mempool
//! mutations and publish the results on the event bus.
//!
//! ## Flow
//!
//! 1. Block notice → fetch header → `add_block` → clear mempool → `Blocks`
//! 2. Tx notice → lookup or decode → `add_tx` → `Tx`
//!
//! One [`EventPump`] drives both handlers from the merged notice streams
//! and finishes each notice before taking the next, so block and
//! transaction handling never interleave.

pub mod block_pump;
pub mod event_pump;
pub mod tx_pump;

pub use block_pump::BlockPump;
pub use event_pump::EventPump;
pub use tx_pump::TxPump;

use bc_01_chain_cache::ChainCacheError;
use bc_03_feed::FeedError;
use thiserror::Error;

/// Why the event pump stopped. Every variant is fatal for the process.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error("chain cache failure: {0}")]
    Cache(#[from] ChainCacheError),

    #[error("feed failure: {0}")]
    Feed(#[from] FeedError),

    #[error("{stream} stream closed")]
    StreamClosed { stream: &'static str },
}
