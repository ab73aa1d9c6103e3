//! # Shared Bus - In-Process Event Bus
//!
//! Carries chain cache snapshots and mempool sightings from the ingest side
//! of the server to the broadcast dispatcher.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Event       │                    │  Broadcast   │
//! │    pump      │    publish()       │  Dispatcher  │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Ordering
//!
//! Events are delivered to each subscriber in publish order. A single pump
//! publishes both kinds, one notice at a time, and clears the mempool before
//! it publishes a `Blocks` event, so no `Tx` event from before a block is
//! published after that block's snapshot.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ClockEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts skipping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
