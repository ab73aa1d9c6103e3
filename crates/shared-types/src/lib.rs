//! # Shared Types Crate
//!
//! This crate contains the domain entities exchanged between the block clock
//! subsystems: block headers as reported by the node, transaction summaries,
//! immutable chain snapshots and the static display parameters.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the JSON shape of a header here is the shape
//!   written to the mirror file and pushed to browsers.
//! - **Verbatim Display Fields**: fields the node reports that the server does
//!   not interpret are carried through untouched.
//! - **Immutable Snapshots**: subscribers only ever see `Arc<ChainSnapshot>`.

pub mod entities;
pub mod params;
pub mod snapshot;

pub use entities::*;
pub use params::NetworkParams;
pub use snapshot::ChainSnapshot;

pub use bitcoin::{BlockHash, Network, Txid};
