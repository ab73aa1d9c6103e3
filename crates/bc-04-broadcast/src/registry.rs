//! # Subscriber Registry
//!
//! Every connected client, its lifecycle state and its outbound queue.
//!
//! Delivery to one subscriber never waits on or fails because of another:
//! frames are handed over with `try_send`. A full queue drops the frame for
//! that subscriber only; a closed queue removes the subscriber.
//!
//! While a subscriber is catching up, broadcasts are held in a bounded
//! per-connection backlog and flushed in order when it goes live, so they
//! arrive after the catch-up frames and before anything newer.

use crate::domain::{ConnectionId, ConnectionState, Frame, TransitionError};
use bc_telemetry::{BROADCAST_FAILURES, SUBSCRIBERS_CONNECTED};
use dashmap::DashMap;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Slot {
    state: ConnectionState,
    sender: mpsc::Sender<Frame>,
    backlog: VecDeque<Frame>,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Queued for live subscribers.
    pub delivered: usize,
    /// Held for subscribers still catching up.
    pub deferred: usize,
    /// Dropped because a queue or backlog was full.
    pub dropped: usize,
    /// Subscribers removed because their queue was closed.
    pub removed: usize,
}

pub struct SubscriberRegistry {
    subscribers: DashMap<ConnectionId, Slot>,
    buffer: usize,
}

impl SubscriberRegistry {
    /// `buffer` bounds both the outbound queue and the catch-up backlog.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Add a connection in `Connecting` state. The receiver feeds its writer.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.subscribers.insert(
            id,
            Slot {
                state: ConnectionState::Connecting,
                sender,
                backlog: VecDeque::new(),
            },
        );
        SUBSCRIBERS_CONNECTED.set(self.subscribers.len() as f64);
        debug!(connection_id = %id, "Subscriber registered");
        (id, receiver)
    }

    #[must_use]
    pub fn state(&self, id: &ConnectionId) -> Option<ConnectionState> {
        self.subscribers.get(id).map(|slot| slot.state)
    }

    /// Apply a lifecycle transition.
    ///
    /// Going `Live` flushes the backlog into the outbound queue first.
    /// Going `Closed` removes the subscriber and succeeds even if it is
    /// already gone. Returns the previous state (`Closed` if unknown).
    pub fn transition(
        &self,
        id: &ConnectionId,
        next: ConnectionState,
    ) -> Result<ConnectionState, TransitionError> {
        if next == ConnectionState::Closed {
            return Ok(self.close(id).unwrap_or(ConnectionState::Closed));
        }

        let mut slot = self
            .subscribers
            .get_mut(id)
            .ok_or(TransitionError::Unknown(*id))?;
        let previous = slot.state;
        slot.state = previous.transition(next)?;

        if next == ConnectionState::Live {
            let backlog = std::mem::take(&mut slot.backlog);
            let flushed = backlog.len();
            for frame in backlog {
                if slot.sender.try_send(frame).is_err() {
                    BROADCAST_FAILURES.with_label_values(&["backlog_flush"]).inc();
                    warn!(connection_id = %id, "Dropped backlog frame while going live");
                }
            }
            debug!(connection_id = %id, flushed, "Subscriber live");
        }
        Ok(previous)
    }

    /// Remove a subscriber. Returns its last state if it was registered.
    pub fn close(&self, id: &ConnectionId) -> Option<ConnectionState> {
        let removed = self.subscribers.remove(id).map(|(_, slot)| slot.state);
        if removed.is_some() {
            SUBSCRIBERS_CONNECTED.set(self.subscribers.len() as f64);
            debug!(connection_id = %id, "Subscriber closed");
        }
        removed
    }

    /// Hand `frame` to every subscriber.
    pub fn broadcast(&self, frame: &Frame) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();

        for mut entry in self.subscribers.iter_mut() {
            let id = *entry.key();
            let slot = entry.value_mut();
            match slot.state {
                ConnectionState::Live => match slot.sender.try_send(frame.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        BROADCAST_FAILURES.with_label_values(&["queue_full"]).inc();
                        warn!(connection_id = %id, "Subscriber queue full, frame dropped");
                        report.dropped += 1;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(id),
                },
                ConnectionState::Connecting | ConnectionState::CatchingUp => {
                    if slot.backlog.len() >= self.buffer {
                        BROADCAST_FAILURES.with_label_values(&["backlog_full"]).inc();
                        warn!(connection_id = %id, "Catch-up backlog full, frame dropped");
                        report.dropped += 1;
                    } else {
                        slot.backlog.push_back(frame.clone());
                        report.deferred += 1;
                    }
                }
                ConnectionState::Closed => {}
            }
        }

        for id in closed {
            BROADCAST_FAILURES.with_label_values(&["closed"]).inc();
            self.close(&id);
            report.removed += 1;
        }
        report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|entry| entry.state.is_live())
            .count()
    }
}
