//! Ethereum-compatible RPC types for the chainquery read API.
//!
//! This crate provides the wire types returned by the query methods and the
//! request/filter types they accept. Everything here serializes to JSON in
//! the exact format Ethereum tooling expects: quantities as 0x-prefixed hex,
//! camelCase field names, and optional address-like fields omitted (not
//! zeroed) when absent.

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

pub mod block;
pub mod log;
pub mod receipt;
pub mod transaction;

pub use block::{BlockTransactions, RpcBlock};
pub use log::RpcLog;
pub use receipt::RpcReceipt;
pub use transaction::RpcTransaction;

/// Size of the logs bloom filter in bytes.
pub const LOGS_BLOOM_SIZE: usize = 256;

/// Placeholder logs bloom: the store does not track blooms, so responses
/// carry an all-zero filter of the canonical width.
pub fn default_logs_bloom() -> Bytes {
    Bytes::from(vec![0u8; LOGS_BLOOM_SIZE])
}

/// Standard Ethereum block tags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    Latest,
    Earliest,
    Pending,
    Safe,
    Finalized,
}

/// Block number or tag for RPC requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockNumberOrTag {
    /// Specific block number (hex encoded)
    Number(U64),
    /// Block tag
    Tag(BlockTag),
}

impl Default for BlockNumberOrTag {
    fn default() -> Self {
        BlockNumberOrTag::Tag(BlockTag::Latest)
    }
}

impl BlockNumberOrTag {
    /// The literal block number, if this is not a tag.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            BlockNumberOrTag::Number(n) => Some(n.to::<u64>()),
            BlockNumberOrTag::Tag(_) => None,
        }
    }
}

/// Block reference for `eth_getCode`: either a number/tag, or an object
/// naming a block number and/or block hash.
///
/// go-ethereum accepts both encodings for `BlockNumberOrHash` parameters, so
/// both are parsed here. An empty object deserializes successfully with both
/// parts unset; rejecting that is the method's job, which lets it emit the
/// fixed "invalid arguments" message instead of a generic parse error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockId {
    /// Plain number or tag, e.g. `"0x10"` or `"latest"`.
    Number(BlockNumberOrTag),
    /// Object form, e.g. `{"blockHash": "0x..."}`.
    Parts(BlockIdParts),
}

/// Object form of a block reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockIdParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<BlockNumberOrTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
}

impl BlockId {
    /// The number/tag part of the reference, if present.
    pub fn number(&self) -> Option<BlockNumberOrTag> {
        match self {
            BlockId::Number(n) => Some(*n),
            BlockId::Parts(parts) => parts.block_number,
        }
    }

    /// The hash part of the reference, if present.
    pub fn hash(&self) -> Option<B256> {
        match self {
            BlockId::Number(_) => None,
            BlockId::Parts(parts) => parts.block_hash,
        }
    }
}

impl From<BlockNumberOrTag> for BlockId {
    fn from(number: BlockNumberOrTag) -> Self {
        BlockId::Number(number)
    }
}

impl From<B256> for BlockId {
    fn from(hash: B256) -> Self {
        BlockId::Parts(BlockIdParts {
            block_number: None,
            block_hash: Some(hash),
        })
    }
}

/// Filter for eth_getLogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Start block (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockNumberOrTag>,
    /// End block (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockNumberOrTag>,
    /// Contract address(es) to filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<FilterAddress>,
    /// Topic filters (up to 4 positions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Option<FilterTopic>>>,
    /// Block hash (mutually exclusive with from_block/to_block)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
}

impl LogFilter {
    /// The address filter flattened to a plain list; empty means "any".
    pub fn addresses(&self) -> Vec<Address> {
        match &self.address {
            None => vec![],
            Some(FilterAddress::Single(addr)) => vec![*addr],
            Some(FilterAddress::Multiple(addrs)) => addrs.clone(),
        }
    }

    /// The topic filter normalized to one alternative-set per position.
    ///
    /// A `null` position becomes an empty set, which the matcher treats as a
    /// wildcard.
    pub fn topic_matrix(&self) -> Vec<Vec<B256>> {
        match &self.topics {
            None => vec![],
            Some(positions) => positions
                .iter()
                .map(|position| match position {
                    None => vec![],
                    Some(FilterTopic::Single(topic)) => vec![*topic],
                    Some(FilterTopic::Multiple(topics)) => topics.clone(),
                })
                .collect(),
        }
    }
}

/// Address filter - single or multiple addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterAddress {
    Single(Address),
    Multiple(Vec<Address>),
}

/// Topic filter - single topic or array of alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterTopic {
    Single(B256),
    Multiple(Vec<B256>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tag_serialization() {
        let tag = BlockTag::Latest;
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"latest\"");
    }

    #[test]
    fn test_block_number_or_tag() {
        let num = BlockNumberOrTag::Number(U64::from(100));
        let json = serde_json::to_string(&num).unwrap();
        assert_eq!(json, "\"0x64\"");

        let tag = BlockNumberOrTag::Tag(BlockTag::Latest);
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"latest\"");
    }

    #[test]
    fn test_block_id_accepts_both_encodings() {
        let plain: BlockId = serde_json::from_str("\"0x32\"").unwrap();
        assert_eq!(plain.number().and_then(|n| n.as_number()), Some(50));
        assert_eq!(plain.hash(), None);

        let tag: BlockId = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(tag.number(), Some(BlockNumberOrTag::Tag(BlockTag::Latest)));

        let hash_json = format!("{{\"blockHash\": \"{}\"}}", B256::repeat_byte(0x11));
        let by_hash: BlockId = serde_json::from_str(&hash_json).unwrap();
        assert_eq!(by_hash.number(), None);
        assert_eq!(by_hash.hash(), Some(B256::repeat_byte(0x11)));
    }

    #[test]
    fn test_block_id_empty_object_has_neither_part() {
        let empty: BlockId = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.number(), None);
        assert_eq!(empty.hash(), None);
    }

    #[test]
    fn test_filter_addresses_flattening() {
        let none = LogFilter::default();
        assert!(none.addresses().is_empty());

        let single = LogFilter {
            address: Some(FilterAddress::Single(Address::repeat_byte(0x01))),
            ..Default::default()
        };
        assert_eq!(single.addresses(), vec![Address::repeat_byte(0x01)]);

        let multiple = LogFilter {
            address: Some(FilterAddress::Multiple(vec![
                Address::repeat_byte(0x01),
                Address::repeat_byte(0x02),
            ])),
            ..Default::default()
        };
        assert_eq!(multiple.addresses().len(), 2);
    }

    #[test]
    fn test_topic_matrix_null_positions_become_wildcards() {
        let filter = LogFilter {
            topics: Some(vec![
                Some(FilterTopic::Single(B256::repeat_byte(0xaa))),
                None,
                Some(FilterTopic::Multiple(vec![
                    B256::repeat_byte(0xbb),
                    B256::repeat_byte(0xcc),
                ])),
            ]),
            ..Default::default()
        };
        let matrix = filter.topic_matrix();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0], vec![B256::repeat_byte(0xaa)]);
        assert!(matrix[1].is_empty());
        assert_eq!(matrix[2].len(), 2);
    }

    #[test]
    fn test_default_logs_bloom_width() {
        let bloom = default_logs_bloom();
        assert_eq!(bloom.len(), LOGS_BLOOM_SIZE);
        assert!(bloom.iter().all(|b| *b == 0));
    }
}
