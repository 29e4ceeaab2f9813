//! Ethereum-compatible event log types.

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

/// Ethereum-compatible event log.
///
/// This matches the format returned by eth_getLogs and inside receipts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    /// Address that emitted the log
    pub address: Address,
    /// Indexed topics (up to 4)
    pub topics: Vec<B256>,
    /// Unindexed data
    pub data: Bytes,
    /// Block number containing the log
    pub block_number: U64,
    /// Transaction hash
    pub transaction_hash: B256,
    /// Transaction index in block
    pub transaction_index: U64,
    /// Block hash
    pub block_hash: B256,
    /// Log index in block
    pub log_index: U64,
    /// Whether the log was removed by a reorg (served history is final)
    pub removed: bool,
}
