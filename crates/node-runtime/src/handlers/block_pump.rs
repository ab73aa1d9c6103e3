//! # Block Pump
//!
//! Resolves block notices to headers and feeds them to the chain cache.
//! The handler owns the cache, so mutations never overlap.

use crate::handlers::PumpError;
use bc_01_chain_cache::ChainCacheApi;
use bc_02_mempool::MempoolTracker;
use bc_03_feed::{BlockNotice, FeedAdapter};
use shared_bus::{ClockEvent, EventPublisher};
use shared_types::ChainSnapshot;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BlockPump<C: ChainCacheApi> {
    cache: C,
    feed: Arc<dyn FeedAdapter>,
    mempool: Arc<MempoolTracker>,
    bus: Arc<dyn EventPublisher>,
}

impl<C: ChainCacheApi> BlockPump<C> {
    pub fn new(
        cache: C,
        feed: Arc<dyn FeedAdapter>,
        mempool: Arc<MempoolTracker>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            cache,
            feed,
            mempool,
            bus,
        }
    }

    /// Handle one notice.
    ///
    /// Returns `Ok(None)` when the announced block is no longer known to the
    /// node (reorged away before the lookup).
    ///
    /// ## Errors
    ///
    /// Any other header fetch failure and any cache failure are fatal.
    pub async fn handle(
        &mut self,
        notice: BlockNotice,
    ) -> Result<Option<Arc<ChainSnapshot>>, PumpError> {
        let query = notice.query();
        let header = match self.feed.fetch_header(query).await {
            Ok(header) => header,
            Err(e) if e.is_not_found() => {
                info!(query = %query, "[bc-01] Announced block not found, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let height = header.height;
        let hash = header.hash;
        let snapshot = self.cache.add_block(header)?;

        // Cleared before publishing so no pre-block tx follows the snapshot.
        let cleared = self.mempool.on_block();
        let receivers = self.bus.publish(ClockEvent::blocks(Arc::clone(&snapshot))).await;

        info!(height, hash = %hash, blocks = snapshot.len(), "[bc-01] Block added");
        debug!(cleared, receivers, "Blocks event published");
        Ok(Some(snapshot))
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}
