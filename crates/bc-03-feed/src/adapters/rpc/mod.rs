//! Typed node RPC calls over any `RpcTransport`.

pub mod http;

pub use http::HttpTransport;

use crate::domain::{FeedError, HeaderQuery};
use crate::ports::RpcTransport;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{BlockHash, BlockHeader, TxOutput, TxSummary, Txid};
use tracing::trace;

/// Subset of `getrawtransaction <txid> true` the server uses.
#[derive(Debug, Deserialize)]
struct VerboseTransaction {
    txid: Txid,
    vout: Vec<TxOutput>,
}

/// Node calls shared by both backends.
pub struct NodeRpc<T> {
    transport: T,
}

impl<T: RpcTransport> NodeRpc<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call_as<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, FeedError> {
        trace!(method, "Node RPC call");
        let value = self.transport.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| FeedError::Decode {
            message: format!("{method}: {e}"),
        })
    }

    /// `getblockcount`
    pub async fn block_count(&self) -> Result<u64, FeedError> {
        self.call_as("getblockcount", vec![]).await
    }

    /// `getblockhash <height>`
    pub async fn block_hash(&self, height: u64) -> Result<BlockHash, FeedError> {
        self.call_as("getblockhash", vec![json!(height)]).await
    }

    /// `getblockheader <hash> true`
    pub async fn block_header(&self, hash: &BlockHash) -> Result<BlockHeader, FeedError> {
        self.call_as("getblockheader", vec![json!(hash.to_string()), json!(true)])
            .await
    }

    pub async fn header(&self, query: HeaderQuery) -> Result<BlockHeader, FeedError> {
        let hash = match query {
            HeaderQuery::Hash(hash) => hash,
            HeaderQuery::Height(height) => self.block_hash(height).await?,
        };
        self.block_header(&hash).await
    }

    /// `getrawmempool`
    pub async fn raw_mempool(&self) -> Result<Vec<Txid>, FeedError> {
        self.call_as("getrawmempool", vec![]).await
    }

    /// `getrawtransaction <txid> true`, reduced to its outputs.
    pub async fn transaction(&self, txid: &Txid) -> Result<TxSummary, FeedError> {
        let tx: VerboseTransaction = self
            .call_as(
                "getrawtransaction",
                vec![json!(txid.to_string()), json!(true)],
            )
            .await?;
        Ok(TxSummary::new(tx.txid, tx.vout))
    }
}
