//! # Integration Tests
//!
//! Every test starts a real [`BlockclockRuntime`] on an ephemeral port,
//! with its mirror in a temporary directory and a [`MockFeed`] standing in
//! for the node.

pub mod flows;
pub mod restart;
pub mod websocket;

use anyhow::Result;
use bc_03_feed::MockFeed;
use bc_04_broadcast::{ConnectionId, ConnectionState, Frame, SubscriberRegistry};
use node_runtime::{BlockclockRuntime, NodeConfig, ShutdownHandle};
use serde_json::Value;
use shared_types::ChainSnapshot;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Upper bound on any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(2);

/// Regtest configuration with the mirror and static files under `dir`.
pub fn config_in(dir: &Path) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.network.test = true;
    config.set_html_dir(dir.to_path_buf());
    config.server.port = 0;
    config
}

/// A running blockclock process.
pub struct TestNode {
    pub feed: Arc<MockFeed>,
    pub addr: SocketAddr,
    pub mirror: PathBuf,
    pub registry: Arc<SubscriberRegistry>,
    pub mempool: Arc<bc_02_mempool::MempoolTracker>,
    pub snapshots: watch::Receiver<Arc<ChainSnapshot>>,
    shutdown: ShutdownHandle,
    task: JoinHandle<Result<()>>,
}

impl TestNode {
    pub async fn start(feed: Arc<MockFeed>, config: NodeConfig) -> Self {
        let mirror = config.cache.mirror_path.clone();
        let runtime = BlockclockRuntime::initialize(config, feed.clone())
            .await
            .expect("runtime initializes");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        Self {
            feed,
            addr,
            mirror,
            registry: runtime.registry(),
            mempool: runtime.mempool(),
            snapshots: runtime.snapshots(),
            shutdown: runtime.shutdown_handle(),
            task: tokio::spawn(runtime.run(listener)),
        }
    }

    /// Wait until the published snapshot's tip is at `height`.
    pub async fn wait_for_tip(&mut self, height: u64) -> Arc<ChainSnapshot> {
        tokio::time::timeout(
            WAIT,
            self.snapshots
                .wait_for(|s| s.tip().map(|tip| tip.height) == Some(height)),
        )
        .await
        .expect("tip reached in time")
        .unwrap()
        .clone()
    }

    /// Request shutdown and return how the runtime ended.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.trigger();
        self.join().await
    }

    /// Wait for the runtime to end on its own.
    pub async fn join(self) -> Result<()> {
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("runtime stopped in time")
            .expect("runtime task did not panic")
    }
}

/// Register a subscriber and take it straight to `Live`.
pub fn live_subscriber(registry: &SubscriberRegistry) -> (ConnectionId, mpsc::Receiver<Frame>) {
    let (id, frames) = registry.register();
    registry
        .transition(&id, ConnectionState::CatchingUp)
        .unwrap();
    registry.transition(&id, ConnectionState::Live).unwrap();
    (id, frames)
}

pub async fn next_frame(frames: &mut mpsc::Receiver<Frame>) -> Frame {
    tokio::time::timeout(WAIT, frames.recv())
        .await
        .expect("frame arrived in time")
        .expect("queue open")
}

/// Split a `42["name",payload]` event frame.
pub fn parse_event(frame: &str) -> (String, Value) {
    let body = frame
        .strip_prefix("42")
        .unwrap_or_else(|| panic!("not an event frame: {frame}"));
    let Value::Array(mut parts) = serde_json::from_str(body).unwrap() else {
        panic!("event body is not an array: {body}");
    };
    let payload = parts.pop().unwrap();
    let name = parts.pop().unwrap().as_str().unwrap().to_string();
    (name, payload)
}

/// Poll `condition` until it holds or [`WAIT`] elapses.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
