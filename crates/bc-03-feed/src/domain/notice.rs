//! Notifications carried by the feed streams.
//!
//! A notice only says that something exists. The runtime's event pump
//! fetches the details.

use shared_types::{BlockHash, Txid};
use std::fmt;

/// "A new block exists."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNotice {
    Hash(BlockHash),
    Height(u64),
}

impl BlockNotice {
    /// Lookup that resolves this notice to a header.
    #[must_use]
    pub fn query(&self) -> HeaderQuery {
        match *self {
            Self::Hash(hash) => HeaderQuery::Hash(hash),
            Self::Height(height) => HeaderQuery::Height(height),
        }
    }
}

/// "A transaction entered the mempool."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxNotice {
    Id(Txid),
    /// Consensus-encoded transaction, summarized locally.
    Raw(Vec<u8>),
}

/// Point lookup of a block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderQuery {
    Height(u64),
    Hash(BlockHash),
}

impl fmt::Display for HeaderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height(h) => write!(f, "block at height {h}"),
            Self::Hash(hash) => write!(f, "block {hash}"),
        }
    }
}
