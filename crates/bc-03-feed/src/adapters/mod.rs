//! # Adapters Layer
//!
//! - `bitcoind` - JSON-RPC over HTTP plus ZMQ notifications
//! - `push` - JSON-RPC and notifications over one WebSocket
//! - `rpc` - typed node calls shared by both backends
//! - `decode` - local summaries of raw transactions
//! - `mock` - scripted feed for tests (feature `test-utils`)

pub mod bitcoind;
pub mod decode;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod push;
pub mod rpc;
pub mod zmq_sub;

pub use bitcoind::BitcoindFeed;
pub use decode::{summarize_hex, summarize_raw};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockFeed;
pub use push::WsPushFeed;
pub use rpc::{HttpTransport, NodeRpc};
pub use zmq_sub::{ZmqMessage, ZmqTopic};
