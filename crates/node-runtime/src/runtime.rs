//! # Blockclock Runtime
//!
//! Owns every long-running task of the process and the order they start in.
//!
//! ## Startup Sequence
//!
//! 1. Subscribe to the feed's block and transaction streams
//! 2. Restore or backfill the chain cache
//! 3. Start the broadcast dispatcher
//! 4. Start the HTTP / WebSocket server
//! 5. Start the event pump over both notice streams
//!
//! Streams are subscribed before the backfill so that blocks mined while
//! it runs are queued rather than missed.
//!
//! ## Shutdown
//!
//! The first of Ctrl-C, a pump failure or a server failure raises the
//! shutdown flag. The server and every connection observe it and close;
//! the pump is aborted.

use crate::adapters::{FeedSource, LiveCatchUp};
use crate::container::NodeConfig;
use crate::handlers::{BlockPump, EventPump, PumpError, TxPump};
use anyhow::{anyhow, Context, Result};
use bc_01_chain_cache::{ChainCacheService, InitOutcome, JsonFileMirror, SystemTimeSource};
use bc_02_mempool::{MempoolConfig, MempoolTracker};
use bc_03_feed::{BlockNotice, FeedAdapter, TxNotice};
use bc_04_broadcast::{serve, AppState, BroadcastError, Dispatcher, SubscriberRegistry};
use futures::stream::BoxStream;
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
use shared_types::ChainSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// How long stopped tasks get to finish before they are abandoned.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type LiveCache = ChainCacheService<JsonFileMirror, SystemTimeSource>;

/// Raises the process-wide shutdown flag.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self(Arc::new(sender))
    }

    pub fn trigger(&self) {
        if !self.0.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }
}

/// The wired-up server, ready to run.
pub struct BlockclockRuntime {
    config: NodeConfig,
    feed: Arc<dyn FeedAdapter>,
    cache: LiveCache,
    init: InitOutcome,
    block_notices: BoxStream<'static, BlockNotice>,
    tx_notices: BoxStream<'static, TxNotice>,
    mempool: Arc<MempoolTracker>,
    bus: Arc<InMemoryEventBus>,
    registry: Arc<SubscriberRegistry>,
    shutdown: ShutdownHandle,
}

impl BlockclockRuntime {
    /// Subscribe to `feed` and bring the chain cache up to date.
    ///
    /// ## Errors
    ///
    /// Fails when the feed refuses a subscription, the mirror is corrupt or
    /// unwritable, or the node cannot supply the backfill headers.
    pub async fn initialize(config: NodeConfig, feed: Arc<dyn FeedAdapter>) -> Result<Self> {
        info!(
            backend = feed.name(),
            network = %feed.network(),
            mirror = %config.cache.mirror_path.display(),
            "Initializing blockclock"
        );

        let block_notices = feed
            .subscribe_blocks()
            .await
            .context("subscribing to block notifications")?;
        let tx_notices = feed
            .subscribe_transactions()
            .await
            .context("subscribing to transaction notifications")?;

        let mut cache = ChainCacheService::new(
            config.cache.clone(),
            JsonFileMirror::new(&config.cache.mirror_path),
            SystemTimeSource,
        )?;
        let init = cache
            .initialize(&FeedSource::new(Arc::clone(&feed)))
            .await
            .context("initializing chain cache")?;

        let mempool = Arc::new(MempoolTracker::new(MempoolConfig {
            catch_up_limit: config.server.catch_up_limit,
            ..MempoolConfig::default()
        }));
        let registry = Arc::new(SubscriberRegistry::new(config.server.outbound_buffer));

        Ok(Self {
            config,
            feed,
            cache,
            init,
            block_notices,
            tx_notices,
            mempool,
            bus: Arc::new(InMemoryEventBus::new()),
            registry,
            shutdown: ShutdownHandle::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// How the chain cache was populated.
    #[must_use]
    pub fn init_outcome(&self) -> &InitOutcome {
        &self.init
    }

    #[must_use]
    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn mempool(&self) -> Arc<MempoolTracker> {
        Arc::clone(&self.mempool)
    }

    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Receiver that always holds the latest chain snapshot.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<Arc<ChainSnapshot>> {
        self.cache.watch()
    }

    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run every task until shutdown is requested or one of them fails.
    ///
    /// ## Errors
    ///
    /// Returns the failure that stopped the process. A requested shutdown
    /// returns `Ok(())`.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        let Self {
            config,
            feed,
            cache,
            init: _,
            block_notices,
            tx_notices,
            mempool,
            bus,
            registry,
            shutdown,
        } = self;
        let stop = shutdown.subscribe();

        let dispatcher = Dispatcher::new(Arc::clone(&registry)).with_snapshots(cache.watch());
        let dispatcher_task =
            tokio::spawn(dispatcher.run(bus.subscribe(EventFilter::all()), stop.clone()));

        let source = FeedSource::new(Arc::clone(&feed));
        let catch_up = LiveCatchUp::new(cache.watch(), Arc::clone(&mempool), source.clone());
        let state = AppState::new(
            Arc::clone(&registry),
            Arc::new(catch_up),
            config.params(),
            config.server.clone(),
            stop.clone(),
        );
        let mut server = tokio::spawn(serve(listener, state));

        let publisher: Arc<dyn EventPublisher> = bus;
        let pump = EventPump::new(
            BlockPump::new(cache, feed, Arc::clone(&mempool), Arc::clone(&publisher)),
            TxPump::new(source, mempool, publisher),
        );
        let mut events = tokio::spawn(pump.run(block_notices, tx_notices));

        info!(
            network = %config.network(),
            port = config.server.port,
            "Blockclock running"
        );

        let mut server_done = false;
        let mut requested = stop.clone();
        let outcome = tokio::select! {
            res = &mut events => pump_outcome(res),
            res = &mut server => {
                server_done = true;
                server_outcome(res)
            }
            () = stop_requested(&mut requested) => Ok(()),
        };

        if let Err(e) = &outcome {
            error!(error = %format!("{e:#}"), "Fatal error, shutting down");
        }
        shutdown.trigger();
        events.abort();

        if !server_done {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(res) => {
                    if let Err(e) = server_outcome(res) {
                        warn!(error = %format!("{e:#}"), "HTTP server stopped with an error");
                    }
                }
                Err(_) => {
                    warn!("HTTP server did not stop in time, aborting");
                    server.abort();
                }
            }
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, dispatcher_task)
            .await
            .is_err()
        {
            warn!("Broadcast dispatcher did not stop in time");
        }

        info!("Shutdown complete");
        outcome
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn pump_outcome(res: Result<Result<(), PumpError>, JoinError>) -> Result<()> {
    match res {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("event pump stopped")),
        Err(e) => Err(anyhow!("event pump panicked: {e}")),
    }
}

fn server_outcome(res: Result<Result<(), BroadcastError>, JoinError>) -> Result<()> {
    match res {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("HTTP server failed")),
        Err(e) => Err(anyhow!("HTTP server panicked: {e}")),
    }
}

/// Spawn a task that raises `shutdown` on Ctrl-C.
pub fn shutdown_on_ctrl_c(shutdown: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C, shutting down"),
        }
        shutdown.trigger();
    })
}
