//! # Transaction Pump
//!
//! Turns transaction notices into summaries, tracks them and publishes a
//! `tx` event for each. Lookups that fail are dropped without an event.

use crate::adapters::FeedSource;
use bc_02_mempool::MempoolTracker;
use bc_03_feed::{summarize_raw, TxNotice};
use bc_telemetry::TX_LOOKUP_FAILURES;
use shared_bus::{ClockEvent, EventPublisher};
use shared_types::{Network, TxSummary};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TxPump {
    source: FeedSource,
    mempool: Arc<MempoolTracker>,
    bus: Arc<dyn EventPublisher>,
    network: Network,
}

impl TxPump {
    pub fn new(
        source: FeedSource,
        mempool: Arc<MempoolTracker>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let network = source.feed().network();
        Self {
            source,
            mempool,
            bus,
            network,
        }
    }

    /// Handle one notice. Returns the tracked summary, if any.
    pub async fn handle(&self, notice: TxNotice) -> Option<Arc<TxSummary>> {
        let summary = match notice {
            TxNotice::Id(txid) => self.mempool.lookup(&self.source, &txid).await?,
            TxNotice::Raw(bytes) => match summarize_raw(&bytes, self.network) {
                Ok(summary) => summary,
                Err(e) => {
                    TX_LOOKUP_FAILURES.with_label_values(&["decode"]).inc();
                    warn!(error = %e, bytes = bytes.len(), "[bc-02] Undecodable raw transaction");
                    return None;
                }
            },
        };

        let summary = self.mempool.add_tx(summary);
        let receivers = self.bus.publish(ClockEvent::Tx(Arc::clone(&summary))).await;
        debug!(txid = %summary.hash, receivers, "Tx event published");
        Some(summary)
    }
}
