//! Ethereum-compatible transaction types.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Ethereum-compatible transaction representation.
///
/// This matches the format returned by eth_getTransactionByHash and inside
/// full-transaction block responses. Legacy signature fields (v, r, s) are
/// carried as-is from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Block hash containing the transaction
    pub block_hash: B256,
    /// Block number containing the transaction
    pub block_number: U64,
    /// Sender address
    pub from: Address,
    /// Gas limit
    pub gas: U64,
    /// Gas price
    pub gas_price: U256,
    /// Transaction hash
    pub hash: B256,
    /// Call data
    pub input: Bytes,
    /// Sender nonce
    pub nonce: U64,
    /// Recipient address (omitted for contract creation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Transaction index in block
    pub transaction_index: U64,
    /// Transferred value in wei
    pub value: U256,
    /// Signature recovery id
    pub v: U256,
    /// Signature r
    pub r: U256,
    /// Signature s
    pub s: U256,
}
