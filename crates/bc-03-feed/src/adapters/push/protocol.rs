//! JSON-RPC frames exchanged with a push node.
//!
//! Requests carry an id and are answered by a frame with the same id.
//! Notifications carry a `method` and no id:
//! - `block` with params `[hash]` (or `[height]`)
//! - `tx` with params `[txid]` or `[rawhex]`

use crate::domain::{BlockNotice, FeedError, TxNotice};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{BlockHash, Txid};
use std::str::FromStr;

/// Length of a txid in hex. A raw transaction is always longer.
const TXID_HEX_LEN: usize = 64;

#[derive(Debug, Serialize)]
struct WsRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct WsFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<WsError>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WsError {
    code: i64,
    message: String,
}

/// A decoded frame from the node.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    Response { id: u64, result: Result<Value, FeedError> },
    Block(BlockNotice),
    Tx(TxNotice),
    /// Notification this client does not use.
    Ignored(String),
}

pub fn encode_request(id: u64, method: &str, params: &[Value]) -> Result<String, FeedError> {
    serde_json::to_string(&WsRequest {
        jsonrpc: "2.0",
        id,
        method,
        params,
    })
    .map_err(FeedError::decode)
}

pub fn parse_frame(text: &str) -> Result<Incoming, FeedError> {
    let frame: WsFrame = serde_json::from_str(text).map_err(FeedError::decode)?;

    if let Some(method) = frame.method {
        let first = frame.params.first();
        return match method.as_str() {
            "block" => block_notice(first).map(Incoming::Block),
            "tx" => tx_notice(first).map(Incoming::Tx),
            _ => Ok(Incoming::Ignored(method)),
        };
    }

    let id = frame.id.ok_or_else(|| FeedError::Decode {
        message: "frame with neither id nor method".to_string(),
    })?;
    let result = match frame.error {
        Some(error) => Err(FeedError::from_rpc(error.code, error.message)),
        None => Ok(frame.result.unwrap_or(Value::Null)),
    };
    Ok(Incoming::Response { id, result })
}

fn block_notice(param: Option<&Value>) -> Result<BlockNotice, FeedError> {
    match param {
        Some(Value::String(hash)) => BlockHash::from_str(hash)
            .map(BlockNotice::Hash)
            .map_err(FeedError::decode),
        Some(Value::Number(n)) => n.as_u64().map(BlockNotice::Height).ok_or_else(|| {
            FeedError::Decode {
                message: format!("block height {n}"),
            }
        }),
        other => Err(FeedError::Decode {
            message: format!("block notification param {other:?}"),
        }),
    }
}

fn tx_notice(param: Option<&Value>) -> Result<TxNotice, FeedError> {
    let Some(Value::String(s)) = param else {
        return Err(FeedError::Decode {
            message: format!("tx notification param {param:?}"),
        });
    };
    if s.len() == TXID_HEX_LEN {
        Txid::from_str(s).map(TxNotice::Id).map_err(FeedError::decode)
    } else {
        hex::decode(s).map(TxNotice::Raw).map_err(FeedError::decode)
    }
}
