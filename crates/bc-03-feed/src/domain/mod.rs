//! # Domain Layer

pub mod config;
pub mod error;
pub mod notice;

pub use config::{FeedBackend, FeedConfig, MAINNET_RPC_PORT, REGTEST_RPC_PORT};
pub use error::FeedError;
pub use notice::{BlockNotice, HeaderQuery, TxNotice};
