//! Push backend: one WebSocket carrying JSON-RPC calls and the node's
//! `block`/`tx` notifications.
//!
//! A writer task owns the sink and a reader task owns the stream. The
//! reader routes responses through `PendingCalls` and notifications into
//! the block and tx channels. When the connection ends, outstanding calls
//! fail with `Closed` and both notification streams end.

pub mod pending;
pub mod protocol;

pub use pending::PendingCalls;

use crate::adapters::rpc::NodeRpc;
use crate::domain::{BlockNotice, FeedConfig, FeedError, HeaderQuery, TxNotice};
use crate::ports::{FeedAdapter, RpcTransport};
use async_trait::async_trait;
use bc_telemetry::FEED_NOTIFICATIONS;
use futures::stream::{BoxStream, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use protocol::Incoming;
use serde_json::{json, Value};
use shared_types::{BlockHeader, Network, TxSummary, Txid};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

const CONNECTION: &str = "push connection";

fn connection_closed() -> FeedError {
    FeedError::Closed {
        stream: CONNECTION.to_string(),
    }
}

/// JSON-RPC over the shared WebSocket.
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Message>,
    pending: Arc<PendingCalls>,
    closed: Arc<AtomicBool>,
    timeout: Duration,
}

#[async_trait]
impl RpcTransport for WsTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, FeedError> {
        let (id, response) = self.pending.register(method);
        if self.closed.load(Ordering::SeqCst) {
            self.pending.cancel(id);
            return Err(connection_closed());
        }

        let text = match protocol::encode_request(id, method, &params) {
            Ok(text) => text,
            Err(e) => {
                self.pending.cancel(id);
                return Err(e);
            }
        };
        if self.outbound.send(Message::text(text)).is_err() {
            self.pending.cancel(id);
            return Err(connection_closed());
        }

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(connection_closed()),
            Err(_) => {
                self.pending.cancel(id);
                Err(FeedError::Timeout {
                    method: method.to_string(),
                })
            }
        }
    }
}

pub struct WsPushFeed {
    rpc: NodeRpc<WsTransport>,
    network: Network,
    blocks: Mutex<Option<mpsc::UnboundedReceiver<BlockNotice>>>,
    transactions: Mutex<Option<mpsc::UnboundedReceiver<TxNotice>>>,
}

impl WsPushFeed {
    /// Open the WebSocket and start the reader and writer tasks.
    pub async fn connect(config: &FeedConfig, network: Network) -> Result<Self, FeedError> {
        let url = config.push_url.as_str();
        let (ws_stream, _) = connect_async(url).await.map_err(|e| FeedError::Transport {
            message: format!("connect {url}: {e}"),
        })?;
        info!(url, "Push feed connected");

        let (mut write, read) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (block_tx, block_rx) = mpsc::unbounded_channel();
        let (tx_tx, tx_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingCalls::new());
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = write.send(message).await {
                    debug!(error = %e, "Push writer stopped");
                    break;
                }
            }
        });

        tokio::spawn(read_loop(
            read,
            pending.clone(),
            closed.clone(),
            outbound.clone(),
            block_tx,
            tx_tx,
        ));

        Ok(Self {
            rpc: NodeRpc::new(WsTransport {
                outbound,
                pending,
                closed,
                timeout: config.request_timeout,
            }),
            network,
            blocks: Mutex::new(Some(block_rx)),
            transactions: Mutex::new(Some(tx_rx)),
        })
    }

    async fn watch(&self, topic: &str) -> Result<(), FeedError> {
        self.rpc
            .transport()
            .call("watch", vec![json!(topic)])
            .await
            .map(|_| ())
    }
}

async fn read_loop(
    mut read: WsRead,
    pending: Arc<PendingCalls>,
    closed: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<Message>,
    blocks: mpsc::UnboundedSender<BlockNotice>,
    transactions: mpsc::UnboundedSender<TxNotice>,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => match protocol::parse_frame(text.as_str()) {
                Ok(Incoming::Response { id, result }) => {
                    pending.complete(id, result);
                }
                Ok(Incoming::Block(notice)) => {
                    FEED_NOTIFICATIONS.with_label_values(&["block"]).inc();
                    let _ = blocks.send(notice);
                }
                Ok(Incoming::Tx(notice)) => {
                    FEED_NOTIFICATIONS.with_label_values(&["tx"]).inc();
                    let _ = transactions.send(notice);
                }
                Ok(Incoming::Ignored(method)) => {
                    debug!(method = %method, "Ignoring push notification");
                }
                Err(e) => warn!(error = %e, "Malformed frame from push node"),
            },
            Ok(Message::Ping(data)) => {
                let _ = outbound.send(Message::Pong(data));
            }
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "Push node closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Push connection failed");
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    let failed = pending.fail_all(&connection_closed());
    warn!(failed_calls = failed, "Push feed disconnected");
}

#[async_trait]
impl FeedAdapter for WsPushFeed {
    fn name(&self) -> &'static str {
        "push"
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, BlockNotice>, FeedError> {
        let rx = self.blocks.lock().take().ok_or_else(|| FeedError::Transport {
            message: "block stream already subscribed".to_string(),
        })?;
        self.watch("chain").await?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn subscribe_transactions(&self) -> Result<BoxStream<'static, TxNotice>, FeedError> {
        let rx = self
            .transactions
            .lock()
            .take()
            .ok_or_else(|| FeedError::Transport {
                message: "tx stream already subscribed".to_string(),
            })?;
        self.watch("mempool").await?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn fetch_header(&self, query: HeaderQuery) -> Result<BlockHeader, FeedError> {
        self.rpc.header(query).await
    }

    async fn current_height(&self) -> Result<u64, FeedError> {
        self.rpc.block_count().await
    }

    async fn fetch_mempool_ids(&self) -> Result<Vec<Txid>, FeedError> {
        self.rpc.raw_mempool().await
    }

    async fn fetch_transaction(&self, txid: &Txid) -> Result<TxSummary, FeedError> {
        self.rpc.transaction(txid).await
    }
}
