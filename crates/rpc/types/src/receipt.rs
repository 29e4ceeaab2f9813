//! Ethereum-compatible transaction receipt types.

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

use crate::log::RpcLog;

/// Ethereum-compatible transaction receipt.
///
/// This matches the format returned by eth_getTransactionReceipt. The logs
/// list is always a JSON array, never null, even when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Status (1 = success, 0 = failure)
    pub status: U64,
    /// Cumulative gas used in block up to this transaction
    pub cumulative_gas_used: U64,
    /// Logs bloom filter (not indexed, always the zero bloom)
    pub logs_bloom: Bytes,
    /// Logs emitted by this transaction
    pub logs: Vec<RpcLog>,
    /// Transaction hash
    pub transaction_hash: B256,
    /// Contract address if this was a contract creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Gas used by this transaction
    pub gas_used: U64,
    /// Block hash
    pub block_hash: B256,
    /// Block number
    pub block_number: U64,
    /// Transaction index in block
    pub transaction_index: U64,
    /// Sender address
    pub from: Address,
    /// Recipient address (omitted for contract creation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
}

impl RpcReceipt {
    /// Status code for successful transaction.
    pub const STATUS_SUCCESS: u64 = 1;
    /// Status code for failed transaction.
    pub const STATUS_FAILURE: u64 = 0;

    /// Check if the transaction was successful.
    pub fn is_success(&self) -> bool {
        self.status == U64::from(Self::STATUS_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_logs_bloom;
    use serde_json::Value;

    fn sample_receipt(to: Option<Address>, contract_address: Option<Address>) -> RpcReceipt {
        RpcReceipt {
            status: U64::from(RpcReceipt::STATUS_SUCCESS),
            cumulative_gas_used: U64::from(21000),
            logs_bloom: default_logs_bloom(),
            logs: vec![],
            transaction_hash: B256::repeat_byte(0x11),
            contract_address,
            gas_used: U64::from(21000),
            block_hash: B256::repeat_byte(0x22),
            block_number: U64::from(100),
            transaction_index: U64::from(0),
            from: Address::repeat_byte(0x33),
            to,
        }
    }

    #[test]
    fn test_receipt_serialization() {
        let json_value: Value =
            serde_json::to_value(sample_receipt(Some(Address::repeat_byte(0x44)), None)).unwrap();
        assert_eq!(json_value["status"], "0x1");
        assert_eq!(json_value["gasUsed"], "0x5208");
        assert_eq!(json_value["logs"], serde_json::json!([]));
        assert!(json_value.get("contractAddress").is_none());
    }

    #[test]
    fn test_contract_creation_receipt() {
        let json_value: Value =
            serde_json::to_value(sample_receipt(None, Some(Address::repeat_byte(0x55)))).unwrap();
        assert!(json_value.get("to").is_none());
        assert_eq!(
            json_value["contractAddress"],
            format!("{}", Address::repeat_byte(0x55))
        );
    }

    #[test]
    fn test_is_success() {
        let mut receipt = sample_receipt(None, None);
        assert!(receipt.is_success());
        receipt.status = U64::from(RpcReceipt::STATUS_FAILURE);
        assert!(!receipt.is_success());
    }
}
