//! # Feed Source Adapter
//!
//! Implements the chain cache's `HeaderSource` and the mempool tracker's
//! `MempoolSource` over whichever `FeedAdapter` backend is configured.
//!
//! `FeedError::NotFound` becomes the subsystem's own `NotFound`; every other
//! failure becomes `Unavailable`.

use async_trait::async_trait;
use bc_01_chain_cache::{HeaderSource, HeaderSourceError};
use bc_02_mempool::{LookupError, MempoolSource};
use bc_03_feed::{FeedAdapter, HeaderQuery};
use shared_types::{BlockHeader, TxSummary, Txid};
use std::sync::Arc;

#[derive(Clone)]
pub struct FeedSource {
    feed: Arc<dyn FeedAdapter>,
}

impl FeedSource {
    pub fn new(feed: Arc<dyn FeedAdapter>) -> Self {
        Self { feed }
    }

    pub fn feed(&self) -> &Arc<dyn FeedAdapter> {
        &self.feed
    }
}

#[async_trait]
impl HeaderSource for FeedSource {
    async fn current_height(&self) -> Result<u64, HeaderSourceError> {
        self.feed
            .current_height()
            .await
            .map_err(|e| HeaderSourceError::Unavailable {
                message: e.to_string(),
            })
    }

    async fn header_at(&self, height: u64) -> Result<BlockHeader, HeaderSourceError> {
        self.feed
            .fetch_header(HeaderQuery::Height(height))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    HeaderSourceError::NotFound { height }
                } else {
                    HeaderSourceError::Unavailable {
                        message: e.to_string(),
                    }
                }
            })
    }
}

#[async_trait]
impl MempoolSource for FeedSource {
    async fn mempool_ids(&self) -> Result<Vec<Txid>, LookupError> {
        self.feed
            .fetch_mempool_ids()
            .await
            .map_err(|e| LookupError::Unavailable {
                message: e.to_string(),
            })
    }

    async fn transaction(&self, txid: &Txid) -> Result<TxSummary, LookupError> {
        self.feed.fetch_transaction(txid).await.map_err(|e| {
            if e.is_not_found() {
                LookupError::NotFound { txid: *txid }
            } else {
                LookupError::Unavailable {
                    message: e.to_string(),
                }
            }
        })
    }
}
