//! # Feed Errors

use thiserror::Error;

/// Node RPC code for an unknown block or transaction.
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
/// Node RPC code for a bad parameter, used for "Block height out of range".
pub const RPC_INVALID_PARAMETER: i64 = -8;

/// Errors reported by a feed backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The node does not know the requested block or transaction.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// HTTP, WebSocket or ZMQ I/O failure.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Error reported by the node other than not-found.
    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Payload that could not be interpreted.
    #[error("malformed payload: {message}")]
    Decode { message: String },

    /// A subscription or the underlying connection is gone.
    #[error("{stream} closed")]
    Closed { stream: String },

    #[error("{method} timed out")]
    Timeout { method: String },

    #[error("invalid feed configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl FeedError {
    /// Classify an error object returned by the node.
    #[must_use]
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            RPC_INVALID_ADDRESS_OR_KEY | RPC_INVALID_PARAMETER => Self::NotFound { what: message },
            _ => Self::Rpc { code, message },
        }
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// The expected race where an announced item vanished before lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
