//! ZMQ notifications from bitcoind.
//!
//! Each subscription owns one SUB socket polled on a dedicated OS thread
//! (the `zmq` crate is blocking). Messages are forwarded into a tokio
//! channel. The thread exits when the receiving side is dropped or the
//! socket fails, which ends the stream.

use crate::domain::{BlockNotice, FeedError, TxNotice};
use shared_types::{BlockHash, Txid};
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Receive timeout, bounding how long a dropped subscription keeps its thread.
const RECV_TIMEOUT_MS: i32 = 1_000;
const CHANNEL_CAPACITY: usize = 1_024;

/// Notification topics published by bitcoind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZmqTopic {
    HashBlock,
    HashTx,
    RawTx,
}

impl ZmqTopic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HashBlock => "hashblock",
            Self::HashTx => "hashtx",
            Self::RawTx => "rawtx",
        }
    }
}

/// One `[topic, body, sequence]` multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmqMessage {
    pub topic: String,
    pub body: Vec<u8>,
    pub sequence: Option<u32>,
}

impl ZmqMessage {
    pub fn from_parts(mut parts: Vec<Vec<u8>>) -> Result<Self, FeedError> {
        if parts.len() < 2 {
            return Err(FeedError::Decode {
                message: format!("zmq message with {} frame(s)", parts.len()),
            });
        }
        let sequence = parts
            .get(2)
            .and_then(|s| <[u8; 4]>::try_from(s.as_slice()).ok())
            .map(u32::from_le_bytes);
        let body = std::mem::take(&mut parts[1]);
        let topic = String::from_utf8_lossy(&parts[0]).into_owned();
        Ok(Self {
            topic,
            body,
            sequence,
        })
    }

    /// Hash bodies arrive in display byte order, so the hex encoding of the
    /// body is the usual hash string.
    fn display_hex(&self) -> Result<String, FeedError> {
        if self.body.len() != 32 {
            return Err(FeedError::Decode {
                message: format!("{} body of {} bytes", self.topic, self.body.len()),
            });
        }
        Ok(hex::encode(&self.body))
    }

    pub fn block_notice(&self) -> Result<BlockNotice, FeedError> {
        let hash = BlockHash::from_str(&self.display_hex()?).map_err(FeedError::decode)?;
        Ok(BlockNotice::Hash(hash))
    }

    pub fn tx_notice(&self) -> Result<TxNotice, FeedError> {
        if self.topic == ZmqTopic::RawTx.as_str() {
            return Ok(TxNotice::Raw(self.body.clone()));
        }
        let txid = Txid::from_str(&self.display_hex()?).map_err(FeedError::decode)?;
        Ok(TxNotice::Id(txid))
    }
}

/// Tracks the per-topic sequence number to report dropped notifications.
#[derive(Debug, Default)]
struct SequenceTracker {
    last: Option<u32>,
}

impl SequenceTracker {
    /// Number of messages skipped before `sequence`.
    fn observe(&mut self, sequence: u32) -> u32 {
        let gap = match self.last {
            Some(last) => sequence.wrapping_sub(last).wrapping_sub(1),
            None => 0,
        };
        self.last = Some(sequence);
        gap
    }
}

/// Connect a SUB socket to `endpoint` for `topic` and forward messages.
///
/// Connection errors are reported here; later socket failures end the
/// returned channel.
pub fn subscribe(endpoint: &str, topic: ZmqTopic) -> Result<mpsc::Receiver<ZmqMessage>, FeedError> {
    let ctx = zmq::Context::new();
    let socket = ctx
        .socket(zmq::SocketType::SUB)
        .map_err(FeedError::transport)?;
    socket
        .set_rcvtimeo(RECV_TIMEOUT_MS)
        .map_err(FeedError::transport)?;
    socket
        .set_subscribe(topic.as_str().as_bytes())
        .map_err(FeedError::transport)?;
    socket.connect(endpoint).map_err(|e| FeedError::Transport {
        message: format!("zmq connect {endpoint}: {e}"),
    })?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let name = format!("zmq-{}", topic.as_str());
    let thread_endpoint = endpoint.to_string();
    std::thread::Builder::new()
        .name(name)
        .spawn(move || receive_loop(socket, topic, &thread_endpoint, tx))
        .map_err(FeedError::transport)?;

    info!(endpoint, topic = topic.as_str(), "ZMQ subscription opened");
    Ok(rx)
}

fn receive_loop(
    socket: zmq::Socket,
    topic: ZmqTopic,
    endpoint: &str,
    tx: mpsc::Sender<ZmqMessage>,
) {
    let mut sequence = SequenceTracker::default();
    loop {
        match socket.recv_multipart(0) {
            Ok(parts) => {
                let message = match ZmqMessage::from_parts(parts) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(topic = topic.as_str(), error = %e, "Ignoring malformed ZMQ message");
                        continue;
                    }
                };
                if let Some(seq) = message.sequence {
                    let gap = sequence.observe(seq);
                    if gap > 0 {
                        warn!(topic = topic.as_str(), missed = gap, "ZMQ notifications lost");
                    }
                }
                if tx.blocking_send(message).is_err() {
                    break;
                }
            }
            Err(zmq::Error::EAGAIN) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => {
                warn!(endpoint, topic = topic.as_str(), error = %e, "ZMQ receive failed");
                break;
            }
        }
    }
    debug!(topic = topic.as_str(), "ZMQ subscription closed");
}
