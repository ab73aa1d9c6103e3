//! # Mempool Tracker
//!
//! Summaries of transactions sighted since the last block, in sighting
//! order. Cleared wholesale on every block. Nothing is persisted.

use crate::domain::{LookupError, MempoolConfig};
use crate::ports::MempoolSource;
use bc_telemetry::{MEMPOOL_SIZE, TRANSACTIONS_SEEN, TX_LOOKUP_FAILURES};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use shared_types::{TxSummary, Txid};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared tracker. The event pump and every connection's catch-up use it
/// concurrently; critical sections never span an `.await`.
#[derive(Debug, Default)]
pub struct MempoolTracker {
    entries: Mutex<Vec<Arc<TxSummary>>>,
    config: MempoolConfig,
}

impl MempoolTracker {
    #[must_use]
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Append a sighting. Resubmitted ids are appended again.
    pub fn add_tx(&self, summary: TxSummary) -> Arc<TxSummary> {
        let summary = Arc::new(summary);
        let len = {
            let mut entries = self.entries.lock();
            entries.push(summary.clone());
            entries.len()
        };
        TRANSACTIONS_SEEN.inc();
        MEMPOOL_SIZE.set(len as f64);
        debug!(txid = %summary.hash, outputs = summary.outputs.len(), "Transaction tracked");
        summary
    }

    /// Forget everything. Returns how many entries were dropped.
    pub fn on_block(&self) -> usize {
        let cleared = std::mem::take(&mut *self.entries.lock()).len();
        MEMPOOL_SIZE.set(0.0);
        debug!(cleared, "Mempool tracker cleared on block");
        cleared
    }

    /// Copy of the current entries, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<TxSummary>> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Summarize a sighted transaction, applying the failure policy.
    ///
    /// `NotFound` is the expected race with block inclusion and is logged at
    /// debug. Any other failure is logged at warn. Both are counted and both
    /// yield `None`, so no `tx` event is emitted.
    pub async fn lookup<S>(&self, source: &S, txid: &Txid) -> Option<TxSummary>
    where
        S: MempoolSource + ?Sized,
    {
        match source.transaction(txid).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                record_lookup_failure(txid, &e);
                None
            }
        }
    }

    /// Build the mempool view for one new connection.
    ///
    /// Ids come from the node; summaries already tracked are reused and only
    /// unknown ids are looked up. At most `catch_up_limit` summaries are
    /// returned, in the node's order. If the node cannot list its mempool the
    /// tracker's own entries are returned instead.
    pub async fn catch_up<S>(&self, source: &S) -> Vec<Arc<TxSummary>>
    where
        S: MempoolSource + ?Sized,
    {
        let limit = self.config.catch_up_limit;

        let ids = match source.mempool_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Mempool listing failed, using tracked entries");
                let mut own = self.list();
                own.truncate(limit);
                return own;
            }
        };

        let known: HashMap<Txid, Arc<TxSummary>> = self
            .list()
            .into_iter()
            .map(|s| (s.hash, s))
            .collect();

        let total = ids.len();
        let wanted: Vec<Txid> = ids.into_iter().take(limit).collect();
        let reused = reused_count(&wanted, &known);
        let summaries: Vec<Arc<TxSummary>> = stream::iter(wanted)
            .map(|txid| {
                let cached = known.get(&txid).cloned();
                async move {
                    match cached {
                        Some(summary) => Some(summary),
                        None => self.lookup(source, &txid).await.map(Arc::new),
                    }
                }
            })
            .buffered(self.config.lookup_concurrency.max(1))
            .filter_map(|s| async move { s })
            .collect()
            .await;

        info!(
            node_mempool = total,
            sent = summaries.len(),
            reused,
            "Mempool catch-up built"
        );
        summaries
    }
}

/// How many of `wanted` are answered from tracked entries.
fn reused_count(wanted: &[Txid], known: &HashMap<Txid, Arc<TxSummary>>) -> usize {
    wanted.iter().filter(|txid| known.contains_key(*txid)).count()
}

fn record_lookup_failure(txid: &Txid, error: &LookupError) {
    TX_LOOKUP_FAILURES.with_label_values(&[error.kind()]).inc();
    if error.is_not_found() {
        debug!(txid = %txid, "Transaction vanished before lookup");
    } else {
        warn!(txid = %txid, error = %error, "Transaction lookup failed");
    }
}
