//! JSON-RPC API trait definitions using jsonrpsee.
//!
//! This module defines the Ethereum-compatible read API that the server
//! implements. All methods are queries over indexed history; there is no
//! submission or state-execution surface.

use alloy_primitives::{Address, Bytes, B256, U64};
use chainquery_rpc_types::{
    BlockId, BlockNumberOrTag, LogFilter, RpcBlock, RpcLog, RpcReceipt, RpcTransaction,
};
use jsonrpsee::proc_macros::rpc;

/// Ethereum namespace RPC API.
///
/// This trait defines the query methods that wallets, indexer consumers, and
/// tooling expect from an Ethereum-compatible endpoint.
#[rpc(server, namespace = "eth")]
pub trait EthApi {
    /// Returns the number of the most recently indexed block.
    #[method(name = "blockNumber")]
    async fn block_number(&self) -> Result<U64, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns block information by block number or tag.
    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns block information by block hash.
    #[method(name = "getBlockByHash")]
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns the number of transactions in a block by block number or tag.
    #[method(name = "getBlockTransactionCountByNumber")]
    async fn get_block_transaction_count_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<U64>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns the number of transactions in a block by block hash.
    #[method(name = "getBlockTransactionCountByHash")]
    async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns a transaction by block hash and index within the block.
    #[method(name = "getTransactionByBlockHashAndIndex")]
    async fn get_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<RpcTransaction>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns a transaction by block number and index within the block.
    #[method(name = "getTransactionByBlockNumberAndIndex")]
    async fn get_transaction_by_block_number_and_index(
        &self,
        block: BlockNumberOrTag,
        index: U64,
    ) -> Result<Option<RpcTransaction>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns the receipt of a transaction by transaction hash.
    #[method(name = "getTransactionReceipt")]
    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RpcReceipt>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns the logs emitted by a transaction.
    ///
    /// Unknown transactions are an error; a known transaction with no logs
    /// returns null rather than an empty array.
    #[method(name = "getTransactionLogs")]
    async fn get_transaction_logs(
        &self,
        hash: B256,
    ) -> Result<Option<Vec<RpcLog>>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns logs matching the given filter. Never null.
    #[method(name = "getLogs")]
    async fn get_logs(
        &self,
        filter: LogFilter,
    ) -> Result<Vec<RpcLog>, jsonrpsee::types::ErrorObjectOwned>;

    /// Returns code at a given address, as of the referenced block.
    #[method(name = "getCode")]
    async fn get_code(
        &self,
        address: Address,
        block: BlockId,
    ) -> Result<Option<Bytes>, jsonrpsee::types::ErrorObjectOwned>;
}
