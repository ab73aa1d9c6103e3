//! Connection identity and lifecycle.
//!
//! ```text
//! Connecting ──handshake──► CatchingUp ──catch-up sent──► Live
//!      │                        │                          │
//!      └────────────────────────┴──────── close ───────────┴──► Closed
//! ```
//!
//! `Closed` is terminal and closing twice is not an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of one client connection (UUID v7, time-ordered).
///
/// Also sent to the client as the session id of the open packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Socket accepted, handshake not yet sent.
    Connecting,
    /// Receiving the initial snapshot and mempool. Broadcasts are held back.
    CatchingUp,
    /// Receiving broadcasts as they happen.
    Live,
    Closed,
}

impl ConnectionState {
    /// Whether `self → next` is a legal move.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::CatchingUp) | (Self::CatchingUp, Self::Live) | (_, Self::Closed)
        )
    }

    /// Move to `next`, or explain why not.
    pub fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Invalid {
                from: self,
                to: next,
            })
        }
    }

    /// Broadcasts are delivered straight to the socket queue.
    #[must_use]
    pub fn is_live(self) -> bool {
        self == Self::Live
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid connection transition {from:?} -> {to:?}")]
    Invalid {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),
}
