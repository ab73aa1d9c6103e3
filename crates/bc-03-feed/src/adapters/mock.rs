//! Scripted in-memory feed for tests.
//!
//! Holds a chain of headers and a mempool. Tests announce blocks and
//! transactions by hand and can make the node unavailable or close the
//! streams to simulate a lost connection.

use crate::domain::{BlockNotice, FeedError, HeaderQuery, TxNotice};
use crate::ports::FeedAdapter;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use shared_types::fixtures;
use shared_types::{BlockHeader, Network, TxSummary, Txid};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Default)]
struct NodeState {
    headers: BTreeMap<u64, BlockHeader>,
    transactions: HashMap<Txid, TxSummary>,
    mempool: Vec<Txid>,
    unavailable: bool,
}

struct Channel<T> {
    sender: Option<mpsc::UnboundedSender<T>>,
    receiver: Option<mpsc::UnboundedReceiver<T>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

pub struct MockFeed {
    network: Network,
    state: Mutex<NodeState>,
    blocks: Mutex<Channel<BlockNotice>>,
    transactions: Mutex<Channel<TxNotice>>,
    header_fetches: AtomicUsize,
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new(Network::Regtest)
    }
}

impl MockFeed {
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: Mutex::new(NodeState::default()),
            blocks: Mutex::new(Channel::new()),
            transactions: Mutex::new(Channel::new()),
            header_fetches: AtomicUsize::new(0),
        }
    }

    /// Feed whose chain holds fixture headers for `heights`.
    #[must_use]
    pub fn with_chain(heights: std::ops::RangeInclusive<u64>) -> Self {
        let feed = Self::default();
        for height in heights {
            feed.add_header(fixtures::header(height));
        }
        feed
    }

    /// Make a header known to the node without announcing it.
    pub fn add_header(&self, header: BlockHeader) {
        self.state.lock().headers.insert(header.height, header);
    }

    /// Add a transaction to the node's mempool without announcing it.
    pub fn add_transaction(&self, summary: TxSummary) {
        let mut state = self.state.lock();
        state.mempool.push(summary.hash);
        state.transactions.insert(summary.hash, summary);
    }

    /// Forget a transaction, as if it was mined or evicted.
    pub fn forget_transaction(&self, txid: &Txid) {
        let mut state = self.state.lock();
        state.transactions.remove(txid);
        state.mempool.retain(|t| t != txid);
    }

    /// Make every lookup fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Mine a fixture block at `height` and announce it by hash.
    pub fn mine(&self, height: u64) -> BlockHeader {
        let header = fixtures::header(height);
        self.add_header(header.clone());
        self.announce_block(BlockNotice::Hash(header.hash));
        header
    }

    pub fn announce_block(&self, notice: BlockNotice) {
        if let Some(sender) = &self.blocks.lock().sender {
            let _ = sender.send(notice);
        }
    }

    pub fn announce_tx(&self, notice: TxNotice) {
        if let Some(sender) = &self.transactions.lock().sender {
            let _ = sender.send(notice);
        }
    }

    /// End both notification streams.
    pub fn disconnect(&self) {
        self.blocks.lock().sender = None;
        self.transactions.lock().sender = None;
    }

    /// Number of `fetch_header` calls served so far.
    #[must_use]
    pub fn header_fetches(&self) -> usize {
        self.header_fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), FeedError> {
        if self.state.lock().unavailable {
            return Err(FeedError::Transport {
                message: "mock node unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FeedAdapter for MockFeed {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, BlockNotice>, FeedError> {
        let rx = self.blocks.lock().receiver.take().ok_or(FeedError::Closed {
            stream: "mock block stream".to_string(),
        })?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn subscribe_transactions(&self) -> Result<BoxStream<'static, TxNotice>, FeedError> {
        let rx = self
            .transactions
            .lock()
            .receiver
            .take()
            .ok_or(FeedError::Closed {
                stream: "mock tx stream".to_string(),
            })?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn fetch_header(&self, query: HeaderQuery) -> Result<BlockHeader, FeedError> {
        self.header_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let state = self.state.lock();
        let found = match query {
            HeaderQuery::Height(height) => state.headers.get(&height),
            HeaderQuery::Hash(hash) => state.headers.values().find(|h| h.hash == hash),
        };
        found.cloned().ok_or_else(|| FeedError::NotFound {
            what: query.to_string(),
        })
    }

    async fn current_height(&self) -> Result<u64, FeedError> {
        self.check_available()?;
        self.state
            .lock()
            .headers
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| FeedError::NotFound {
                what: "chain tip".to_string(),
            })
    }

    async fn fetch_mempool_ids(&self) -> Result<Vec<Txid>, FeedError> {
        self.check_available()?;
        Ok(self.state.lock().mempool.clone())
    }

    async fn fetch_transaction(&self, txid: &Txid) -> Result<TxSummary, FeedError> {
        self.check_available()?;
        self.state
            .lock()
            .transactions
            .get(txid)
            .cloned()
            .ok_or_else(|| FeedError::NotFound {
                what: format!("transaction {txid}"),
            })
    }
}
