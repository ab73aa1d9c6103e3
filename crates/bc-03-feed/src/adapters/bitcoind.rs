//! bitcoind backend: JSON-RPC over HTTP for lookups, ZMQ for notifications.

use crate::adapters::rpc::{HttpTransport, NodeRpc};
use crate::adapters::zmq_sub::{self, ZmqMessage, ZmqTopic};
use crate::domain::{BlockNotice, FeedConfig, FeedError, HeaderQuery, TxNotice};
use crate::ports::FeedAdapter;
use async_trait::async_trait;
use bc_telemetry::FEED_NOTIFICATIONS;
use futures::stream::{BoxStream, StreamExt};
use shared_types::{BlockHeader, Network, TxSummary, Txid};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

pub struct BitcoindFeed {
    rpc: NodeRpc<HttpTransport>,
    zmq_endpoint: String,
    tx_topic: ZmqTopic,
    network: Network,
}

impl BitcoindFeed {
    pub fn new(config: &FeedConfig, network: Network) -> Result<Self, FeedError> {
        let transport = HttpTransport::new(config)?;
        info!(
            rpc = transport.url(),
            zmq = %config.zmq_endpoint,
            raw_tx = config.raw_tx,
            "bitcoind feed configured"
        );
        Ok(Self {
            rpc: NodeRpc::new(transport),
            zmq_endpoint: config.zmq_endpoint.clone(),
            tx_topic: if config.raw_tx {
                ZmqTopic::RawTx
            } else {
                ZmqTopic::HashTx
            },
            network,
        })
    }

    fn notices<N, F>(
        rx: tokio::sync::mpsc::Receiver<ZmqMessage>,
        stream: &'static str,
        decode: F,
    ) -> BoxStream<'static, N>
    where
        N: Send + 'static,
        F: Fn(&ZmqMessage) -> Result<N, FeedError> + Send + Sync + 'static,
    {
        ReceiverStream::new(rx)
            .filter_map(move |message| {
                let notice = match decode(&message) {
                    Ok(notice) => {
                        FEED_NOTIFICATIONS.with_label_values(&[stream]).inc();
                        Some(notice)
                    }
                    Err(e) => {
                        warn!(topic = %message.topic, error = %e, "Undecodable ZMQ notification");
                        None
                    }
                };
                futures::future::ready(notice)
            })
            .boxed()
    }
}

#[async_trait]
impl FeedAdapter for BitcoindFeed {
    fn name(&self) -> &'static str {
        "bitcoind"
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, BlockNotice>, FeedError> {
        let rx = zmq_sub::subscribe(&self.zmq_endpoint, ZmqTopic::HashBlock)?;
        Ok(Self::notices(rx, "block", ZmqMessage::block_notice))
    }

    async fn subscribe_transactions(&self) -> Result<BoxStream<'static, TxNotice>, FeedError> {
        let rx = zmq_sub::subscribe(&self.zmq_endpoint, self.tx_topic)?;
        Ok(Self::notices(rx, "tx", ZmqMessage::tx_notice))
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
