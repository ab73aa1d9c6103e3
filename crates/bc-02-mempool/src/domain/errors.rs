//! # Domain Errors

use shared_types::Txid;
use thiserror::Error;

/// Why a transaction could not be summarized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The node no longer knows the transaction (mined or evicted between
    /// the sighting and the lookup). Expected and harmless.
    #[error("transaction {txid} not found")]
    NotFound { txid: Txid },

    /// Transport, node or decoding failure.
    #[error("transaction lookup failed: {message}")]
    Unavailable { message: String },
}

impl LookupError {
    /// Metric label for this failure.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
