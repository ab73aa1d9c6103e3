//! # Chain Cache Service
//!
//! Owns the bounded chain and its mirror. Every successful mutation:
//! 1. Builds the new chain off to the side
//! 2. Rewrites the mirror
//! 3. Commits the new chain in memory
//! 4. Publishes a fresh immutable snapshot to watchers
//!
//! A failed mirror write therefore leaves both the cache and the mirror at
//! their previous, identical state.

use crate::domain::chain::{backfill_range, BoundedChain};
use crate::domain::config::CacheConfig;
use crate::domain::errors::{ChainCacheError, MirrorError};
use crate::ports::inbound::ChainCacheApi;
use crate::ports::outbound::{HeaderSource, MirrorStore, TimeSource};
use bc_telemetry::{time_histogram, BLOCKS_ADDED, CACHE_SIZE, CHAIN_TIP, MIRROR_WRITE_DURATION};
use shared_types::{BlockHeader, ChainSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How `initialize` populated the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Restored from the mirror.
    Loaded {
        blocks: usize,
        /// Entries dropped because the mirror held more than capacity.
        trimmed: usize,
    },
    /// No mirror existed; fetched from the node.
    Backfilled { from: u64, to: u64 },
}

/// The Chain Cache Service.
pub struct ChainCacheService<M, T>
where
    M: MirrorStore,
    T: TimeSource,
{
    chain: BoundedChain,
    mirror: M,
    time: T,
    config: CacheConfig,
    snapshots: watch::Sender<Arc<ChainSnapshot>>,
}

impl<M, T> ChainCacheService<M, T>
where
    M: MirrorStore,
    T: TimeSource,
{
    /// Create an empty cache. Call `initialize` before use.
    pub fn new(config: CacheConfig, mirror: M, time: T) -> Result<Self, ChainCacheError> {
        config.validate()?;
        let chain = BoundedChain::new(config.capacity)?;
        let (snapshots, _) = watch::channel(Arc::new(ChainSnapshot::empty()));
        Ok(Self {
            chain,
            mirror,
            time,
            config,
            snapshots,
        })
    }

    /// Populate the cache from the mirror, or from `source` when there is no
    /// mirror.
    ///
    /// With `reset` configured the mirror is deleted first.
    ///
    /// ## Errors
    ///
    /// - `CorruptMirror`: the mirror exists but cannot be parsed (fatal,
    ///   the operator decides whether to `--reset`)
    /// - `Tip` / `Backfill`: the node could not supply headers
    /// - `Persist`: the mirror could not be read, deleted or written
    pub async fn initialize<S>(&mut self, source: &S) -> Result<InitOutcome, ChainCacheError>
    where
        S: HeaderSource + ?Sized,
    {
        let location = self.mirror.location();

        if self.config.reset {
            if self.mirror.remove()? {
                info!(mirror = %location, "Mirror deleted on reset");
            } else {
                info!(mirror = %location, "Reset requested but no mirror existed");
            }
        }

        let outcome = match self.mirror.load() {
            Ok(Some(snapshot)) => self.restore(snapshot)?,
            Ok(None) => self.backfill(source).await?,
            Err(MirrorError::Corrupt { location, message }) => {
                return Err(ChainCacheError::CorruptMirror { location, message })
            }
            Err(e) => return Err(e.into()),
        };

        self.publish();
        info!(
            mirror = %location,
            outcome = ?outcome,
            blocks = self.chain.len(),
            tip = ?self.chain.tip_height(),
            "Chain cache initialized"
        );
        Ok(outcome)
    }

    fn restore(&mut self, snapshot: ChainSnapshot) -> Result<InitOutcome, ChainCacheError> {
        let (chain, evicted) = BoundedChain::from_snapshot(snapshot, self.config.capacity)?;
        if !evicted.is_empty() {
            warn!(
                evicted = ?evicted,
                capacity = self.config.capacity,
                "Mirror held more blocks than capacity, trimming"
            );
            self.persist(&chain.snapshot())?;
        }
        self.chain = chain;
        Ok(InitOutcome::Loaded {
            blocks: self.chain.len(),
            trimmed: evicted.len(),
        })
    }

    async fn backfill<S>(&mut self, source: &S) -> Result<InitOutcome, ChainCacheError>
    where
        S: HeaderSource + ?Sized,
    {
        let tip = source
            .current_height()
            .await
            .map_err(ChainCacheError::Tip)?;
        let range = backfill_range(tip, self.config.capacity);
        info!(from = range.start(), to = range.end(), "No mirror found, backfilling");

        let mut chain = BoundedChain::new(self.config.capacity)?;
        for height in range.clone() {
            let mut header = source
                .header_at(height)
                .await
                .map_err(|source| ChainCacheError::Backfill { height, source })?;
            // Never observed locally; chain time is the best available.
            header.recv_time = header.chain_time;
            debug!(height, hash = %header.hash, "Backfilled header");
            chain.insert(header);
        }

        self.persist(&chain.snapshot())?;
        self.chain = chain;
        Ok(InitOutcome::Backfilled {
            from: *range.start(),
            to: *range.end(),
        })
    }

    fn persist(&mut self, snapshot: &ChainSnapshot) -> Result<(), ChainCacheError> {
        let _timer = time_histogram!(MIRROR_WRITE_DURATION);
        self.mirror.store(snapshot)?;
        Ok(())
    }

    fn publish(&self) -> Arc<ChainSnapshot> {
        let snapshot = Arc::new(self.chain.snapshot());
        CACHE_SIZE.set(self.chain.len() as f64);
        if let Some(tip) = self.chain.tip_height() {
            CHAIN_TIP.set(tip as f64);
        }
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    /// Receiver that always holds the latest snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<ChainSnapshot>> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chain.capacity()
    }
}

impl<M, T> ChainCacheApi for ChainCacheService<M, T>
where
    M: MirrorStore,
    T: TimeSource,
{
    fn add_block(&mut self, mut header: BlockHeader) -> Result<Arc<ChainSnapshot>, ChainCacheError> {
        // A re-announced block keeps its first observation time; a different
        // block at the same height (reorg) was first observed now.
        header.recv_time = match self.chain.get(header.height) {
            Some(existing) if existing.hash == header.hash => existing.recv_time,
            _ => self.time.now(),
        };

        let (height, hash) = (header.height, header.hash);
        let mut next = self.chain.clone();
        let insertion = next.insert(header);

        self.persist(&next.snapshot())?;
        self.chain = next;
        BLOCKS_ADDED.inc();

        match &insertion.replaced {
            Some(old) if old.hash != hash => {
                warn!(height, old = %old.hash, new = %hash, "Block replaced at cached height");
            }
            Some(_) => debug!(height, hash = %hash, "Block re-announced"),
            None => {}
        }
        info!(
            height,
            hash = %hash,
            evicted = ?insertion.evicted,
            size = self.chain.len(),
            "Block added to chain cache"
        );

        Ok(self.publish())
    }

    fn check_integrity(&self) -> Result<(), ChainCacheError> {
        let stored = match self.mirror.load() {
            Ok(stored) => stored.unwrap_or_default(),
            Err(MirrorError::Corrupt { location, message }) => {
                return Err(ChainCacheError::CorruptMirror { location, message })
            }
            Err(e) => return Err(e.into()),
        };

        let cached = self.chain.as_map();
        let stored = stored.as_map();

        let missing: Vec<u64> = cached.keys().filter(|h| !stored.contains_key(*h)).copied().collect();
        let unexpected: Vec<u64> = stored.keys().filter(|h| !cached.contains_key(*h)).copied().collect();
        let differing: Vec<u64> = cached
            .iter()
            .filter(|(h, header)| stored.get(*h).is_some_and(|s| s != *header))
            .map(|(h, _)| *h)
            .collect();

        if missing.is_empty() && unexpected.is_empty() && differing.is_empty() {
            Ok(())
        } else {
            Err(ChainCacheError::IntegrityMismatch {
                missing,
                unexpected,
                differing,
            })
        }
    }

    fn snapshot(&self) -> Arc<ChainSnapshot> {
        self.snapshots.borrow().clone()
    }
}

#[cfg(test)]
mod tests;
