//! # Blockclock Node Runtime
//!
//! Library half of the `blockclock` executable: configuration, the
//! adapters that connect subsystems to the feed, the event pump and the
//! runtime that owns it. The binary in `main.rs` only parses arguments
//! and hands over.
//!
//! ## Event Flow
//!
//! ```text
//!  Feed ──BlockNotice──┐
//!                      ├──→ EventPump ──→ BlockPump ──add_block──→ Chain Cache ──→ blocks.json
//!  Feed ──TxNotice─────┘        │            ├──on_block──→ Mempool Tracker
//!                               │            └──Blocks──→ Event Bus ──→ Dispatcher ──→ sockets
//!                               └──────→ TxPump ──Tx────────↗
//! ```
//!
//! The event pump finishes each notice before taking the next.

pub mod adapters;
pub mod cli;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use cli::Cli;
pub use container::{ConfigError, NodeConfig};
pub use runtime::{shutdown_on_ctrl_c, BlockclockRuntime, ShutdownHandle};
