//! # Domain Layer

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;

pub use config::ServerConfig;
pub use connection::{ConnectionId, ConnectionState, TransitionError};
pub use error::BroadcastError;
pub use frame::{clock_event_frame, event_frame, open_packet, ClientPacket, Frame};
