//! # Event Publisher
//!
//! The event pump publishes; the dispatcher subscribes. Delivery order equals
//! publish order for every subscriber.

use crate::events::{ClockEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns how many subscribers the event was queued for.
    async fn publish(&self, event: ClockEvent) -> usize;

    fn events_published(&self) -> u64;
}

/// Process-local bus over `tokio::sync::broadcast`.
///
/// A subscriber more than `capacity` events behind skips the missed events;
/// publishers never wait.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ClockEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Only events published after this call are received.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ClockEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let Ok(receivers) = self.sender.send(event) else {
            debug!(topic = ?topic, "No subscribers, event dropped");
            return 0;
        };
        trace!(topic = ?topic, receivers, "Event published");
        receivers
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
