//! # Broadcast Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("invalid server configuration: {reason}")]
    InvalidConfig { reason: String },

    /// An event could not be turned into a frame. Nothing was sent.
    #[error("failed to encode {event} frame: {message}")]
    Encode { event: &'static str, message: String },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
