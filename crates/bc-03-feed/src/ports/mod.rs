//! # Ports Layer
//!
//! `FeedAdapter` is what the runtime consumes. `RpcTransport` is the seam
//! both backends share: the typed node calls in `adapters::rpc` run over
//! HTTP for bitcoind and over the WebSocket for the push backend.

use crate::domain::{BlockNotice, FeedError, HeaderQuery, TxNotice};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use shared_types::{BlockHeader, Network, TxSummary, Txid};

/// Source of block and transaction activity.
#[async_trait]
pub trait FeedAdapter: Send + Sync {
    /// Backend identity for logs.
    fn name(&self) -> &'static str;

    /// Network the node runs on; used to render addresses.
    fn network(&self) -> Network;

    /// Stream of "a new block exists" notices. Ends when the feed is lost.
    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, BlockNotice>, FeedError>;

    /// Stream of mempool sightings. Ends when the feed is lost.
    async fn subscribe_transactions(&self) -> Result<BoxStream<'static, TxNotice>, FeedError>;

    /// Resolve one header. `NotFound` when the node does not know it.
    async fn fetch_header(&self, query: HeaderQuery) -> Result<BlockHeader, FeedError>;

    async fn current_height(&self) -> Result<u64, FeedError>;

    /// Best-effort list of the node's mempool.
    async fn fetch_mempool_ids(&self) -> Result<Vec<Txid>, FeedError>;

    /// Summarize one transaction. `NotFound` when the node forgot it.
    async fn fetch_transaction(&self, txid: &Txid) -> Result<TxSummary, FeedError>;
}

/// One JSON-RPC round trip to the node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method`. Node-reported errors come back classified through
    /// `FeedError::from_rpc`.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, FeedError>;
}
