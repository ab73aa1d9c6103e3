//! # Broadcast Dispatcher
//!
//! Drains the event bus and fans every event out to the registry. Each
//! event is encoded exactly once; all subscribers share the resulting
//! frame. Delivered frames are immutable, so later cache mutations can
//! never change what a subscriber already received.
//!
//! When the dispatcher falls behind the bus it skips the missed events. If
//! it was given the chain cache's snapshot watch it then resends the latest
//! snapshot before the next event, since a skipped `Blocks` would otherwise
//! leave every subscriber on an old window until the next block.

use crate::domain::{clock_event_frame, BroadcastError};
use crate::registry::{DeliveryReport, SubscriberRegistry};
use bc_telemetry::FRAMES_SENT;
use shared_bus::{ClockEvent, Subscription};
use shared_types::ChainSnapshot;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct Dispatcher {
    registry: Arc<SubscriberRegistry>,
    snapshots: Option<watch::Receiver<Arc<ChainSnapshot>>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self {
            registry,
            snapshots: None,
        }
    }

    /// Resend the latest snapshot from `snapshots` after lagging.
    #[must_use]
    pub fn with_snapshots(mut self, snapshots: watch::Receiver<Arc<ChainSnapshot>>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Encode `event` and hand it to every subscriber.
    pub fn dispatch(&self, event: &ClockEvent) -> Result<DeliveryReport, BroadcastError> {
        let frame = clock_event_frame(event)?;
        let report = self.registry.broadcast(&frame);
        FRAMES_SENT
            .with_label_values(&[event.name()])
            .inc_by(report.delivered as f64);

        match event {
            ClockEvent::Blocks(snapshot) => debug!(
                blocks = snapshot.len(),
                sockets = report.delivered,
                deferred = report.deferred,
                "Blocks sent"
            ),
            ClockEvent::Tx(summary) => debug!(
                txid = %summary.hash,
                sockets = report.delivered,
                deferred = report.deferred,
                "Tx sent"
            ),
        }
        Ok(report)
    }

    /// Send the latest chain snapshot, if a snapshot watch is attached.
    fn resync(&self, skipped: u64) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };
        let latest = Arc::clone(&snapshots.borrow());
        warn!(skipped, blocks = latest.len(), "Dispatcher lagged, resending latest blocks");
        if let Err(e) = self.dispatch(&ClockEvent::blocks(latest)) {
            error!(error = %e, "Failed to encode resync snapshot");
        }
    }

    /// Dispatch until the bus closes or shutdown is signalled.
    pub async fn run(self, mut events: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("Broadcast dispatcher started");
        let mut lagged = events.lagged();
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event bus closed, dispatcher stopping");
                        break;
                    };
                    if events.lagged() > lagged {
                        self.resync(events.lagged() - lagged);
                        lagged = events.lagged();
                    }
                    if let Err(e) = self.dispatch(&event) {
                        error!(event = event.name(), error = %e, "Failed to encode event");
                    }
                }
                () = stop_requested(&mut shutdown) => {
                    info!("Broadcast dispatcher shutting down");
                    break;
                }
            }
        }
        if events.lagged() > 0 {
            info!(lagged = events.lagged(), "Dispatcher skipped events while lagging");
        }
    }
}

/// Resolves once the shutdown flag is raised, including before the call.
pub(crate) async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
