//! # Feed Adapter (bc-03)
//!
//! Tells the rest of the server when blocks and transactions appear and
//! resolves them to headers and summaries.
//!
//! ## Backends
//!
//! | Backend | Lookups | Notifications |
//! |---------|---------|---------------|
//! | `bitcoind` | JSON-RPC over HTTP | ZMQ `hashblock`, `hashtx` or `rawtx` |
//! | `push` | JSON-RPC over WebSocket | `block` / `tx` on the same socket |
//!
//! Both implement [`FeedAdapter`]. Streams end when the connection is lost;
//! there is no reconnect.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Notices, configuration, errors
//! - `ports/` - `FeedAdapter` and the shared `RpcTransport` seam
//! - `adapters/` - bitcoind, push, raw transaction decoding, mock
//! - `factory.rs` - Backend selection from configuration

pub mod adapters;
pub mod domain;
pub mod factory;
pub mod ports;

pub use adapters::{summarize_hex, summarize_raw, BitcoindFeed, WsPushFeed};
#[cfg(any(test, feature = "test-utils"))]
pub use adapters::MockFeed;
pub use domain::{
    BlockNotice, FeedBackend, FeedConfig, FeedError, HeaderQuery, TxNotice, MAINNET_RPC_PORT,
    REGTEST_RPC_PORT,
};
pub use factory::connect_feed;
pub use ports::{FeedAdapter, RpcTransport};
