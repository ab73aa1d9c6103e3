//! Outbound (Driven) ports for the Mempool Tracker.

use crate::domain::LookupError;
use async_trait::async_trait;
use shared_types::{TxSummary, Txid};

/// Node-side view of the mempool.
#[async_trait]
pub trait MempoolSource: Send + Sync {
    /// Best-effort snapshot of the ids currently in the node's mempool.
    async fn mempool_ids(&self) -> Result<Vec<Txid>, LookupError>;

    /// Summarize one transaction.
    async fn transaction(&self, txid: &Txid) -> Result<TxSummary, LookupError>;
}
