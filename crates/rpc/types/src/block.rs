//! Ethereum-compatible block types.

use alloy_primitives::{Address, Bytes, B256, B64, U256, U64};
use serde::{Deserialize, Serialize};

use crate::transaction::RpcTransaction;
use crate::default_logs_bloom;

/// Ethereum-compatible block representation.
///
/// This matches the format returned by eth_getBlockByNumber/eth_getBlockByHash.
/// The index tracks execution data only, so proof-of-work artifacts (nonce,
/// mixHash, difficulty) and uncle data are fixed placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    /// Block number
    pub number: U64,
    /// Block hash
    pub hash: B256,
    /// Parent block hash
    pub parent_hash: B256,
    /// Nonce (PoW artifact, always zero)
    pub nonce: B64,
    /// SHA3 of uncles data (always empty uncles hash)
    pub sha3_uncles: B256,
    /// Bloom filter for logs (not indexed, always the zero bloom)
    pub logs_bloom: Bytes,
    /// Transactions root
    pub transactions_root: B256,
    /// State root
    pub state_root: B256,
    /// Receipts root
    pub receipts_root: B256,
    /// Block miner/validator address
    pub miner: Address,
    /// Mix hash (PoW artifact, always zero)
    pub mix_hash: B256,
    /// Difficulty (PoW artifact, always zero)
    pub difficulty: U64,
    /// Total difficulty (PoW artifact, always zero)
    pub total_difficulty: U64,
    /// Extra data (not indexed, always empty)
    pub extra_data: Bytes,
    /// Block size in bytes
    pub size: U64,
    /// Gas limit
    pub gas_limit: U64,
    /// Gas used
    pub gas_used: U256,
    /// Block timestamp (Unix seconds)
    pub timestamp: U64,
    /// Transactions - either hashes or full objects
    pub transactions: BlockTransactions,
    /// Uncles (always empty)
    pub uncles: Vec<B256>,
}

/// Block transactions - either just hashes or full transaction objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Only transaction hashes
    Hashes(Vec<B256>),
    /// Full transaction objects
    Full(Vec<RpcTransaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RpcBlock {
    /// Empty uncles hash (keccak256 of RLP empty list).
    pub fn empty_uncles_hash() -> B256 {
        // keccak256(rlp([])) = 0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347
        B256::from_slice(&[
            0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc,
            0xd4, 0x1a, 0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd,
            0x40, 0xd4, 0x93, 0x47,
        ])
    }

    /// Empty trie root (keccak256 of RLP empty string), used where the index
    /// does not track a receipts trie.
    pub fn empty_trie_root() -> B256 {
        // keccak256(rlp("")) = 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
        B256::from_slice(&[
            0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0,
            0xf8, 0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5,
            0xe3, 0x63, 0xb4, 0x21,
        ])
    }

    /// Create a minimal block at a given height, placeholders filled in.
    pub fn minimal(number: u64, hash: B256, parent_hash: B256, timestamp: u64) -> Self {
        Self {
            number: U64::from(number),
            hash,
            parent_hash,
            nonce: B64::ZERO,
            sha3_uncles: Self::empty_uncles_hash(),
            logs_bloom: default_logs_bloom(),
            transactions_root: B256::ZERO,
            state_root: B256::ZERO,
            receipts_root: Self::empty_trie_root(),
            miner: Address::ZERO,
            mix_hash: B256::ZERO,
            difficulty: U64::ZERO,
            total_difficulty: U64::ZERO,
            extra_data: Bytes::new(),
            size: U64::ZERO,
            gas_limit: U64::ZERO,
            gas_used: U256::ZERO,
            timestamp: U64::from(timestamp),
            transactions: BlockTransactions::Hashes(vec![]),
            uncles: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_block_serialization() {
        let block = RpcBlock::minimal(1, B256::repeat_byte(0xab), B256::ZERO, 1234567890);
        let json_value: Value = serde_json::to_value(&block).unwrap();
        assert_eq!(json_value["number"], "0x1");
        assert_eq!(json_value["timestamp"], "0x499602d2");
        assert_eq!(json_value["nonce"], "0x0000000000000000");
        assert_eq!(json_value["difficulty"], "0x0");
        assert_eq!(json_value["mixHash"], format!("{}", B256::ZERO));
        assert_eq!(
            json_value["sha3Uncles"],
            "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
        );
        assert_eq!(json_value["transactions"], serde_json::json!([]));
        assert_eq!(json_value["uncles"], serde_json::json!([]));
    }

    #[test]
    fn test_logs_bloom_is_full_width() {
        let block = RpcBlock::minimal(1, B256::ZERO, B256::ZERO, 0);
        let json_value: Value = serde_json::to_value(&block).unwrap();
        let bloom = json_value["logsBloom"].as_str().unwrap();
        // 0x prefix plus two hex chars per byte
        assert_eq!(bloom.len(), 2 + crate::LOGS_BLOOM_SIZE * 2);
    }
}
