//! # Block Clock Events
//!
//! Defines the event types that flow through the shared bus from the chain
//! cache and mempool tracker to the broadcast dispatcher.

use shared_types::{ChainSnapshot, TxSummary};
use std::sync::Arc;

/// All events that can be published to the event bus.
///
/// Payloads are shared immutably: every receiver gets a clone of the same
/// `Arc`, and the cache builds a fresh snapshot for its next mutation.
#[derive(Debug, Clone)]
pub enum ClockEvent {
    /// The chain cache changed. Carries the complete new contents.
    Blocks(Arc<ChainSnapshot>),

    /// A transaction was sighted and summarized.
    Tx(Arc<TxSummary>),
}

impl ClockEvent {
    #[must_use]
    pub fn blocks(snapshot: Arc<ChainSnapshot>) -> Self {
        Self::Blocks(snapshot)
    }

    #[must_use]
    pub fn tx(summary: TxSummary) -> Self {
        Self::Tx(Arc::new(summary))
    }

    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Blocks(_) => EventTopic::Blocks,
            Self::Tx(_) => EventTopic::Tx,
        }
    }

    /// Event name used on the client push channel.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.topic().name()
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Chain cache snapshots.
    Blocks,
    /// Mempool sightings.
    Tx,
    /// Every topic.
    All,
}

impl EventTopic {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Tx => "tx",
            Self::All => "*",
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ClockEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
