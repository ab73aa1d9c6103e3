//! # Chain Snapshot
//!
//! An immutable, height-ordered copy of the chain cache. This is the value
//! written to the mirror file, served at `/blocks.json` and pushed to
//! browsers as the `blocks` event payload.
//!
//! The JSON form is an object keyed by the decimal height:
//!
//! ```text
//! { "800000": { "height": 800000, "hash": "...", "recvtime": ... }, ... }
//! ```

use crate::entities::BlockHeader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Height-ordered set of recent headers.
///
/// There are no mutating methods: a new snapshot is built for every cache
/// mutation and shared as `Arc<ChainSnapshot>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainSnapshot {
    blocks: BTreeMap<u64, BlockHeader>,
}

impl ChainSnapshot {
    #[must_use]
    pub fn new(blocks: BTreeMap<u64, BlockHeader>) -> Self {
        Self { blocks }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
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
    pub fn get(&self, height: u64) -> Option<&BlockHeader> {
        self.blocks.get(&height)
    }

    #[must_use]
    pub fn contains(&self, height: u64) -> bool {
        self.blocks.contains_key(&height)
    }

    /// Highest header in the snapshot.
    #[must_use]
    pub fn tip(&self) -> Option<&BlockHeader> {
        self.blocks.values().next_back()
    }

    /// Lowest header in the snapshot.
    #[must_use]
    pub fn oldest(&self) -> Option<&BlockHeader> {
        self.blocks.values().next()
    }

    /// Heights in ascending order.
    pub fn heights(&self) -> impl Iterator<Item = u64> + '_ {
        self.blocks.keys().copied()
    }

    /// Headers in ascending height order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockHeader> {
        self.blocks.values()
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<u64, BlockHeader> {
        &self.blocks
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<u64, BlockHeader> {
        self.blocks
    }
}

impl FromIterator<BlockHeader> for ChainSnapshot {
    fn from_iter<I: IntoIterator<Item = BlockHeader>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|h| (h.height, h)).collect())
    }
}
