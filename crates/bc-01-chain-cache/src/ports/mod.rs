//! # Ports Layer
//!
//! Hexagonal architecture ports for the Chain Cache subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::ChainCacheApi;
pub use outbound::{HeaderSource, MirrorStore, TimeSource};
