//! # Mempool Tracker (bc-02)
//!
//! Keeps the summaries of transactions sighted since the last block so new
//! connections and the live `tx` stream agree on what is pending.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | 1 | Cleared On Block | `tracker.rs` - `on_block()` empties the list |
//! | 2 | Sighting Order | `tracker.rs` - `add_tx()` appends |
//! | 3 | Silent Lookup Failures | `tracker.rs` - `lookup()` logs, counts, returns `None` |
//!
//! Resubmitted transactions are not deduplicated; they appear once per
//! sighting until the next block.

pub mod domain;
pub mod ports;
pub mod tracker;

pub use domain::{LookupError, MempoolConfig};
pub use ports::MempoolSource;
pub use tracker::MempoolTracker;
