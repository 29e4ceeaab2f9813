//! Types for stored chain data.
//!
//! These are the row projections produced by the ingestion pipeline, separate
//! from the RPC response types in `chainquery_rpc_types`. Fixed-width
//! identifiers are typed (`B256`, `Address`); variable-length quantities are
//! persisted as 0x-prefixed hex strings and decoded at conversion time. A
//! malformed hex field fails the whole conversion; rows are never silently
//! skipped.

use alloy_primitives::{Address, Bytes, B256, B64, U256, U64};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use chainquery_rpc_types::{
    default_logs_bloom, BlockTransactions, RpcBlock, RpcLog, RpcReceipt, RpcTransaction,
};

/// Stored block header with its ordered transactions.
///
/// Transaction order is insertion order, which equals on-chain index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBlock {
    /// Block number/height.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// State root after this block.
    pub state_root: B256,
    /// Transactions root.
    pub transactions_root: B256,
    /// Validator/miner address.
    pub miner: Address,
    /// Block size in bytes.
    pub size: u64,
    /// Gas limit for this block.
    pub gas_limit: u64,
    /// Total gas used, hex quantity.
    pub gas_used: String,
    /// Block timestamp (Unix seconds).
    pub timestamp: u64,
    /// Transactions in on-chain order.
    pub transactions: Vec<StoredTransaction>,
}

impl StoredBlock {
    /// Convert to RPC block format.
    ///
    /// `full_transactions` selects full transaction objects versus bare
    /// hashes. Fields the index does not track are rendered as fixed
    /// placeholders.
    pub fn to_rpc_block(&self, full_transactions: bool) -> StoreResult<RpcBlock> {
        let transactions = if full_transactions {
            let mut txs = Vec::with_capacity(self.transactions.len());
            for tx in &self.transactions {
                txs.push(tx.to_rpc_transaction(self.number, self.hash)?);
            }
            BlockTransactions::Full(txs)
        } else {
            BlockTransactions::Hashes(self.transactions.iter().map(|tx| tx.hash).collect())
        };

        Ok(RpcBlock {
            number: U64::from(self.number),
            hash: self.hash,
            parent_hash: self.parent_hash,
            nonce: B64::ZERO,
            sha3_uncles: RpcBlock::empty_uncles_hash(),
            logs_bloom: default_logs_bloom(),
            transactions_root: self.transactions_root,
            state_root: self.state_root,
            receipts_root: RpcBlock::empty_trie_root(),
            miner: self.miner,
            mix_hash: B256::ZERO,
            difficulty: U64::ZERO,
            total_difficulty: U64::ZERO,
            extra_data: Bytes::new(),
            size: U64::from(self.size),
            gas_limit: U64::from(self.gas_limit),
            gas_used: parse_quantity(&self.gas_used)?,
            timestamp: U64::from(self.timestamp),
            transactions,
            uncles: vec![],
        })
    }
}

/// Stored transaction.
///
/// Block number and hash are denormalized into the wire object from the
/// containing block at conversion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Transaction hash.
    pub hash: B256,
    /// Index within the block.
    pub transaction_index: u32,
    /// Sender address.
    pub from: Address,
    /// Recipient address (None for contract creation).
    pub to: Option<Address>,
    /// Gas limit.
    pub gas: u64,
    /// Gas price, hex quantity.
    pub gas_price: String,
    /// Sender nonce.
    pub nonce: u64,
    /// Transferred value, hex quantity.
    pub value: String,
    /// Signature recovery id, hex quantity.
    pub v: String,
    /// Signature r, hex quantity.
    pub r: String,
    /// Signature s, hex quantity.
    pub s: String,
    /// Call data, hex encoded.
    pub input: String,
}

impl StoredTransaction {
    /// Convert to RPC transaction format.
    pub fn to_rpc_transaction(
        &self,
        block_number: u64,
        block_hash: B256,
    ) -> StoreResult<RpcTransaction> {
        Ok(RpcTransaction {
            block_hash,
            block_number: U64::from(block_number),
            from: self.from,
            gas: U64::from(self.gas),
            gas_price: parse_quantity(&self.gas_price)?,
            hash: self.hash,
            input: parse_bytes(&self.input)?,
            nonce: U64::from(self.nonce),
            to: self.to,
            transaction_index: U64::from(self.transaction_index),
            value: parse_quantity(&self.value)?,
            v: parse_quantity(&self.v)?,
            r: parse_quantity(&self.r)?,
            s: parse_quantity(&self.s)?,
        })
    }
}

/// Stored transaction receipt with its ordered logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReceipt {
    /// Transaction hash (correlation key).
    pub transaction_hash: B256,
    /// Status (1 = success, 0 = failure).
    pub status: u64,
    /// Cumulative gas used up to this transaction.
    pub cumulative_gas_used: u64,
    /// Gas used by this transaction.
    pub gas_used: u64,
    /// Block hash.
    pub block_hash: B256,
    /// Block number.
    pub block_number: u64,
    /// Transaction index in block.
    pub transaction_index: u32,
    /// Sender address.
    pub from: Address,
    /// Recipient address (None for contract creation).
    pub to: Option<Address>,
    /// Contract address if this was a contract creation.
    pub contract_address: Option<Address>,
    /// Logs in emission order.
    pub logs: Vec<StoredLog>,
}

impl StoredReceipt {
    /// Convert to RPC receipt format. The logs field is always a sequence.
    pub fn to_rpc_receipt(&self) -> StoreResult<RpcReceipt> {
        let mut logs = Vec::with_capacity(self.logs.len());
        for log in &self.logs {
            logs.push(log.to_rpc_log()?);
        }

        Ok(RpcReceipt {
            status: U64::from(self.status),
            cumulative_gas_used: U64::from(self.cumulative_gas_used),
            logs_bloom: default_logs_bloom(),
            logs,
            transaction_hash: self.transaction_hash,
            contract_address: self.contract_address,
            gas_used: U64::from(self.gas_used),
            block_hash: self.block_hash,
            block_number: U64::from(self.block_number),
            transaction_index: U64::from(self.transaction_index),
            from: self.from,
            to: self.to,
        })
    }
}

/// Stored event log with full positional context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLog {
    /// Contract address that emitted the log.
    pub address: Address,
    /// Indexed topics; position 0 is the event signature.
    pub topics: Vec<B256>,
    /// Unindexed data, hex encoded.
    pub data: String,
    /// Block number containing the log.
    pub block_number: u64,
    /// Block hash.
    pub block_hash: B256,
    /// Transaction hash.
    pub transaction_hash: B256,
    /// Transaction index in block.
    pub transaction_index: u32,
    /// Log index in block.
    pub log_index: u64,
}

impl StoredLog {
    /// Convert to RPC log format.
    pub fn to_rpc_log(&self) -> StoreResult<RpcLog> {
        Ok(RpcLog {
            address: self.address,
            topics: self.topics.clone(),
            data: parse_bytes(&self.data)?,
            block_number: U64::from(self.block_number),
            transaction_hash: self.transaction_hash,
            transaction_index: U64::from(self.transaction_index),
            block_hash: self.block_hash,
            log_index: U64::from(self.log_index),
            removed: false,
        })
    }
}

/// Stored contract code observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCode {
    /// Contract address.
    pub address: Address,
    /// Code bytes, hex encoded.
    pub code: String,
    /// Height at which the code was observed.
    pub block_number: u64,
}

impl StoredCode {
    /// Decode the stored code hex into bytes.
    pub fn decoded(&self) -> StoreResult<Bytes> {
        parse_bytes(&self.code)
    }
}

/// Parse a 0x-prefixed hex quantity.
pub(crate) fn parse_quantity(value: &str) -> StoreResult<U256> {
    if !value.starts_with("0x") {
        return Err(StoreError::InvalidHex(value.to_string()));
    }
    value
        .parse::<U256>()
        .map_err(|_| StoreError::InvalidHex(value.to_string()))
}

/// Parse a 0x-prefixed hex byte string ("0x" = empty).
pub(crate) fn parse_bytes(value: &str) -> StoreResult<Bytes> {
    if !value.starts_with("0x") {
        return Err(StoreError::InvalidHex(value.to_string()));
    }
    value
        .parse::<Bytes>()
        .map_err(|_| StoreError::InvalidHex(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    pub(crate) fn stored_tx(index: u32) -> StoredTransaction {
        StoredTransaction {
            hash: B256::repeat_byte(0x10 + index as u8),
            transaction_index: index,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
            gas: 21_000,
            gas_price: "0x3b9aca00".to_string(),
            nonce: 5,
            value: "0x64".to_string(),
            v: "0x1b".to_string(),
            r: "0x1".to_string(),
            s: "0x2".to_string(),
            input: "0x".to_string(),
        }
    }

    pub(crate) fn stored_block(number: u64, txs: Vec<StoredTransaction>) -> StoredBlock {
        StoredBlock {
            number,
            hash: B256::repeat_byte(number as u8),
            parent_hash: B256::repeat_byte(number.wrapping_sub(1) as u8),
            state_root: B256::repeat_byte(0xaa),
            transactions_root: B256::repeat_byte(0xbb),
            miner: Address::repeat_byte(0xdd),
            size: 512,
            gas_limit: 30_000_000,
            gas_used: "0x5208".to_string(),
            timestamp: 1_700_000_000,
            transactions: txs,
        }
    }

    #[test]
    fn test_block_conversion_placeholders() {
        let block = stored_block(5, vec![stored_tx(0)]);
        let rpc = block.to_rpc_block(false).unwrap();
        let json: Value = serde_json::to_value(&rpc).unwrap();

        assert_eq!(json["number"], "0x5");
        assert_eq!(json["nonce"], "0x0000000000000000");
        assert_eq!(json["difficulty"], "0x0");
        assert_eq!(json["totalDifficulty"], "0x0");
        assert_eq!(json["extraData"], "0x");
        assert_eq!(json["mixHash"], format!("{}", B256::ZERO));
        assert_eq!(
            json["receiptsRoot"],
            format!("{}", RpcBlock::empty_trie_root())
        );
        assert_eq!(json["gasUsed"], "0x5208");
        assert_eq!(json["uncles"], serde_json::json!([]));
        assert_eq!(
            json["transactions"],
            serde_json::json!([format!("{}", B256::repeat_byte(0x10))])
        );
    }

    #[test]
    fn test_block_conversion_full_transactions_preserve_order() {
        let block = stored_block(5, vec![stored_tx(0), stored_tx(1), stored_tx(2)]);
        let rpc = block.to_rpc_block(true).unwrap();

        match rpc.transactions {
            BlockTransactions::Full(txs) => {
                assert_eq!(txs.len(), 3);
                for (i, tx) in txs.iter().enumerate() {
                    assert_eq!(tx.transaction_index, U64::from(i as u64));
                    assert_eq!(tx.block_number, U64::from(5));
                    assert_eq!(tx.block_hash, block.hash);
                }
            }
            _ => panic!("expected full transactions"),
        }
    }

    #[test]
    fn test_transaction_conversion_decodes_hex_quantities() {
        let tx = stored_tx(0);
        let rpc = tx.to_rpc_transaction(9, B256::repeat_byte(0x09)).unwrap();
        assert_eq!(rpc.gas_price, U256::from(1_000_000_000u64));
        assert_eq!(rpc.value, U256::from(100u64));
        assert_eq!(rpc.v, U256::from(27u64));
        assert!(rpc.input.is_empty());
    }

    #[test]
    fn test_malformed_hex_is_fatal() {
        let mut tx = stored_tx(0);
        tx.value = "0xzz".to_string();
        let err = tx
            .to_rpc_transaction(1, B256::ZERO)
            .expect_err("malformed hex must fail the conversion");
        assert!(matches!(err, StoreError::InvalidHex(_)));

        let mut tx = stored_tx(0);
        tx.input = "deadbeef".to_string();
        assert!(matches!(
            tx.to_rpc_transaction(1, B256::ZERO),
            Err(StoreError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_receipt_conversion_omits_absent_addresses() {
        let receipt = StoredReceipt {
            transaction_hash: B256::repeat_byte(0x11),
            status: 1,
            cumulative_gas_used: 21_000,
            gas_used: 21_000,
            block_hash: B256::repeat_byte(0x22),
            block_number: 7,
            transaction_index: 0,
            from: Address::repeat_byte(0x33),
            to: None,
            contract_address: Some(Address::repeat_byte(0x44)),
            logs: vec![],
        };
        let json: Value = serde_json::to_value(receipt.to_rpc_receipt().unwrap()).unwrap();

        assert!(json.get("to").is_none());
        assert_eq!(
            json["contractAddress"],
            format!("{}", Address::repeat_byte(0x44))
        );
        // Zero logs still serialize as an empty array, never null
        assert_eq!(json["logs"], serde_json::json!([]));
    }

    #[test]
    fn test_log_conversion_preserves_topic_order() {
        let log = StoredLog {
            address: Address::repeat_byte(0x55),
            topics: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            data: "0x0102".to_string(),
            block_number: 3,
            block_hash: B256::repeat_byte(0x66),
            transaction_hash: B256::repeat_byte(0x77),
            transaction_index: 1,
            log_index: 4,
        };
        let rpc = log.to_rpc_log().unwrap();
        assert_eq!(rpc.topics, log.topics);
        assert_eq!(rpc.data, Bytes::from(vec![0x01, 0x02]));
        assert!(!rpc.removed);
    }

    #[test]
    fn test_code_decoding() {
        let code = StoredCode {
            address: Address::repeat_byte(0x01),
            code: "0x6001600101".to_string(),
            block_number: 12,
        };
        assert_eq!(
            code.decoded().unwrap(),
            Bytes::from(vec![0x60, 0x01, 0x60, 0x01, 0x01])
        );

        let bad = StoredCode {
            code: "0xq".to_string(),
            ..code
        };
        assert!(matches!(bad.decoded(), Err(StoreError::InvalidHex(_))));
    }
}
