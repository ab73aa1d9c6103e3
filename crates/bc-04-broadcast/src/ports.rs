//! # Ports
//!
//! What a new connection needs to catch up before it goes live.

use async_trait::async_trait;
use shared_types::{ChainSnapshot, TxSummary};
use std::sync::Arc;

#[async_trait]
pub trait CatchUpSource: Send + Sync {
    /// Current chain cache contents.
    fn blocks(&self) -> Arc<ChainSnapshot>;

    /// Pending transactions to replay, oldest first.
    async fn mempool(&self) -> Vec<Arc<TxSummary>>;
}
