//! # Bounded Chain
//!
//! Pure in-memory model of the cache: at most `capacity` headers keyed by
//! height. After every insertion the smallest heights are evicted until the
//! size is back within capacity.

use crate::domain::errors::ChainCacheError;
use shared_types::{BlockHeader, ChainSnapshot};
use std::collections::BTreeMap;

/// Default number of recent blocks kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// Result of inserting a header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insertion {
    /// Header previously cached at the same height, if any.
    pub replaced: Option<BlockHeader>,
    /// Heights removed to restore the capacity bound, ascending.
    pub evicted: Vec<u64>,
}

/// Height-keyed, capacity-bounded header store.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedChain {
    blocks: BTreeMap<u64, BlockHeader>,
    capacity: usize,
}

impl BoundedChain {
    /// Create an empty chain.
    ///
    /// ## Errors
    ///
    /// - `InvalidConfig`: capacity is zero
    pub fn new(capacity: usize) -> Result<Self, ChainCacheError> {
        if capacity == 0 {
            return Err(ChainCacheError::InvalidConfig {
                reason: "capacity must be at least 1".to_string(),
            });
        }
        Ok(Self {
            blocks: BTreeMap::new(),
            capacity,
        })
    }

    /// Build a chain from a loaded snapshot, trimming it to capacity.
    ///
    /// Returns the chain and the heights that did not fit.
    pub fn from_snapshot(
        snapshot: ChainSnapshot,
        capacity: usize,
    ) -> Result<(Self, Vec<u64>), ChainCacheError> {
        let mut chain = Self::new(capacity)?;
        chain.blocks = snapshot.into_inner();
        let evicted = chain.evict_excess();
        Ok((chain, evicted))
    }

    /// Insert or overwrite the header at `header.height`, then evict.
    pub fn insert(&mut self, header: BlockHeader) -> Insertion {
        let replaced = self.blocks.insert(header.height, header);
        let evicted = self.evict_excess();
        Insertion { replaced, evicted }
    }

    fn evict_excess(&mut self) -> Vec<u64> {
        let mut evicted = Vec::new();
        while self.blocks.len() > self.capacity {
            match self.blocks.pop_first() {
                Some((height, _)) => evicted.push(height),
                None => break,
            }
        }
        evicted
    }

    #[must_use]
    pub fn get(&self, height: u64) -> Option<&BlockHeader> {
        self.blocks.get(&height)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn tip_height(&self) -> Option<u64> {
        self.blocks.keys().next_back().copied()
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<u64, BlockHeader> {
        &self.blocks
    }

    /// Copy the current contents into an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.blocks.clone())
    }
}

/// Heights to fetch when backfilling a cold cache whose node is at `tip`.
///
/// The `capacity` most recent heights, clamped at genesis.
#[must_use]
pub fn backfill_range(tip: u64, capacity: usize) -> std::ops::RangeInclusive<u64> {
    let span = (capacity as u64).saturating_sub(1);
    tip.saturating_sub(span)..=tip
}
