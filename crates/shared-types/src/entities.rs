//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `BlockHeader`, `Bits`
//! - **Mempool**: `TxSummary`, `TxOutput`, `ScriptPubKey`

use bitcoin::{BlockHash, CompactTarget, Txid};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// Compact difficulty target of a block.
///
/// The node reports it as an 8-digit hex string (`"1d00ffff"`); older mirror
/// files and some push backends use the plain integer. Both are accepted and
/// it is always written back as the hex string the browser expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "BitsRepr", into = "String")]
pub struct Bits(pub u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum BitsRepr {
    Hex(String),
    Number(u32),
}

/// A `bits` value that is neither a u32 nor an 8-digit hex string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid compact target {0:?}")]
pub struct InvalidBits(pub String);

impl TryFrom<BitsRepr> for Bits {
    type Error = InvalidBits;

    fn try_from(repr: BitsRepr) -> Result<Self, Self::Error> {
        match repr {
            BitsRepr::Number(n) => Ok(Self(n)),
            BitsRepr::Hex(s) => u32::from_str_radix(s.trim_start_matches("0x"), 16)
                .map(Self)
                .map_err(|_| InvalidBits(s)),
        }
    }
}

impl From<Bits> for String {
    fn from(bits: Bits) -> Self {
        bits.to_string()
    }
}

impl From<CompactTarget> for Bits {
    fn from(target: CompactTarget) -> Self {
        Self(target.to_consensus())
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// A block header as reported by the node, plus the local receive time.
///
/// Only the fields the server interprets are typed. Everything else the node
/// reported (`difficulty`, `mediantime`, `nTx`, `merkleroot`, ...) is kept in
/// `extra` and serialized back unchanged for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height in the chain. Unique key within the cache.
    pub height: u64,
    /// Block identifier.
    pub hash: BlockHash,
    /// Node-reported block time (unix seconds).
    #[serde(rename = "time", alias = "chainTime")]
    pub chain_time: u64,
    /// Compact difficulty target.
    pub bits: Bits,
    /// Local wall-clock time (unix seconds) at which this process first
    /// observed the block. Zero until the chain cache stamps it.
    #[serde(rename = "recvtime", alias = "recvTime", default)]
    pub recv_time: u64,
    /// Display-only fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockHeader {
    /// Create a header with no display fields and no receive time.
    #[must_use]
    pub fn new(height: u64, hash: BlockHash, chain_time: u64, bits: Bits) -> Self {
        Self {
            height,
            hash,
            chain_time,
            bits,
            recv_time: 0,
            extra: Map::new(),
        }
    }

    /// Attach a display field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// CLUSTER B: THE MEMPOOL
// =============================================================================

/// Script descriptor of one output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptPubKey {
    /// Script template name (`pubkeyhash`, `witness_v0_keyhash`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Destination address, when the script has a standard one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Lightweight descriptor of one transaction output.
///
/// Shaped like an entry of the node's `vout` array so RPC results
/// deserialize straight into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Output value in coin units (BTC).
    pub value: f64,
    /// Output index.
    pub n: u32,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: ScriptPubKey,
}

/// A transaction sighted in the mempool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxSummary {
    /// Transaction id.
    pub hash: Txid,
    pub outputs: Vec<TxOutput>,
}

impl TxSummary {
    #[must_use]
    pub fn new(hash: Txid, outputs: Vec<TxOutput>) -> Self {
        Self { hash, outputs }
    }
}

// =============================================================================
// TEST FIXTURES
// =============================================================================

/// Deterministic fixtures used by unit and integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures {
    use super::*;
    use bitcoin::hashes::Hash as _;

    /// Deterministic block hash derived from `seed`.
    #[must_use]
    pub fn block_hash(seed: u64) -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        BlockHash::from_byte_array(bytes)
    }

    /// Deterministic txid derived from `seed`.
    #[must_use]
    pub fn txid(seed: u64) -> Txid {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        bytes[31] = 0x7f;
        Txid::from_byte_array(bytes)
    }

    /// A header at `height` with a hash derived from the height, a chain
    /// time ten minutes per block after 2009-01-03 and a few display fields.
    #[must_use]
    pub fn header(height: u64) -> BlockHeader {
        BlockHeader::new(
            height,
            block_hash(height),
            1_231_006_505 + height * 600,
            Bits(0x1d00_ffff),
        )
        .with_field("difficulty", 1.5_f64)
        .with_field("nTx", 1 + height % 7)
        .with_field("mediantime", 1_231_006_000 + height * 600)
    }

    /// A summary with `outputs` outputs of 0.5 BTC each.
    #[must_use]
    pub fn tx_summary(seed: u64, outputs: u32) -> TxSummary {
        TxSummary::new(
            txid(seed),
            (0..outputs)
                .map(|n| TxOutput {
                    value: 0.5,
                    n,
                    script_pub_key: ScriptPubKey {
                        kind: "witness_v0_keyhash".to_string(),
                        address: None,
                    },
                })
                .collect(),
        )
    }
}
