//! # Catch-up Adapter
//!
//! What a new connection is sent before it goes live: the chain cache's
//! latest published snapshot and the mempool tracker's catch-up view.

use crate::adapters::FeedSource;
use async_trait::async_trait;
use bc_02_mempool::MempoolTracker;
use bc_04_broadcast::CatchUpSource;
use shared_types::{ChainSnapshot, TxSummary};
use std::sync::Arc;
use tokio::sync::watch;

pub struct LiveCatchUp {
    snapshots: watch::Receiver<Arc<ChainSnapshot>>,
    mempool: Arc<MempoolTracker>,
    source: FeedSource,
}

impl LiveCatchUp {
    pub fn new(
        snapshots: watch::Receiver<Arc<ChainSnapshot>>,
        mempool: Arc<MempoolTracker>,
        source: FeedSource,
    ) -> Self {
        Self {
            snapshots,
            mempool,
            source,
        }
    }
}

#[async_trait]
impl CatchUpSource for LiveCatchUp {
    fn blocks(&self) -> Arc<ChainSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    async fn mempool(&self) -> Vec<Arc<TxSummary>> {
        self.mempool.catch_up(&self.source).await
    }
}
