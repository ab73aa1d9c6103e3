//! Local summaries of consensus-encoded transactions.

use crate::domain::FeedError;
use bitcoin::{consensus, Address, Script, Transaction};
use shared_types::{Network, ScriptPubKey, TxOutput, TxSummary};

/// Decode `bytes` and describe its outputs the way the node's verbose
/// `getrawtransaction` would.
pub fn summarize_raw(bytes: &[u8], network: Network) -> Result<TxSummary, FeedError> {
    let tx: Transaction = consensus::deserialize(bytes).map_err(FeedError::decode)?;
    let outputs = tx
        .output
        .iter()
        .enumerate()
        .map(|(n, out)| TxOutput {
            value: out.value.to_btc(),
            n: n as u32,
            script_pub_key: ScriptPubKey {
                kind: script_kind(&out.script_pubkey).to_string(),
                address: Address::from_script(&out.script_pubkey, network)
                    .ok()
                    .map(|a| a.to_string()),
            },
        })
        .collect();
    Ok(TxSummary::new(tx.compute_txid(), outputs))
}

/// Decode a hex string carrying a raw transaction.
pub fn summarize_hex(raw: &str, network: Network) -> Result<TxSummary, FeedError> {
    let bytes = hex::decode(raw).map_err(FeedError::decode)?;
    summarize_raw(&bytes, network)
}

/// Script template names as bitcoind reports them.
fn script_kind(script: &Script) -> &'static str {
    if script.is_p2pkh() {
        "pubkeyhash"
    } else if script.is_p2sh() {
        "scripthash"
    } else if script.is_p2wpkh() {
        "witness_v0_keyhash"
    } else if script.is_p2wsh() {
        "witness_v0_scripthash"
    } else if script.is_p2tr() {
        "witness_v1_taproot"
    } else if script.is_op_return() {
        "nulldata"
    } else if script.is_p2pk() {
        "pubkey"
    } else {
        "nonstandard"
    }
}
