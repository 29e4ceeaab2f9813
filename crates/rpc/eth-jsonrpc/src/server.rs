//! JSON-RPC server implementation.
//!
//! This module provides the RPC server that exposes the Ethereum-compatible
//! query API over HTTP. All chain data comes from an injected [`QueryApi`]
//! provider; the server itself holds no state.

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;

use crate::api::EthApiServer;
use crate::error::RpcError;
use chainquery_rpc_types::{
    BlockId, BlockNumberOrTag, LogFilter, RpcBlock, RpcLog, RpcReceipt, RpcTransaction,
};

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Address to bind the HTTP server to.
    pub http_addr: SocketAddr,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8545)),
        }
    }
}

/// Trait for providing indexed chain data to the RPC server.
///
/// This is the integration point between the RPC layer and the query core.
/// Every method is single-shot: no retries are performed on failure.
#[async_trait]
pub trait QueryApi: Send + Sync + 'static {
    /// Get the latest indexed block height.
    async fn latest_height(&self) -> Result<u64, RpcError>;

    /// Get a block by number or tag.
    async fn block_by_number(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, RpcError>;

    /// Get a block by hash.
    async fn block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, RpcError>;

    /// Get the transaction count of a block by number or tag.
    async fn block_transaction_count_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<u64>, RpcError>;

    /// Get the transaction count of a block by hash.
    async fn block_transaction_count_by_hash(&self, hash: B256)
        -> Result<Option<u64>, RpcError>;

    /// Get a transaction by block hash and index.
    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: u64,
    ) -> Result<Option<RpcTransaction>, RpcError>;

    /// Get a transaction by block number and index.
    async fn transaction_by_block_number_and_index(
        &self,
        block: BlockNumberOrTag,
        index: u64,
    ) -> Result<Option<RpcTransaction>, RpcError>;

    /// Get a transaction receipt by transaction hash.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, RpcError>;

    /// Get the logs of a transaction by hash.
    ///
    /// `Err(TransactionNotFound)` for an unknown hash; `Ok(None)` for a known
    /// transaction with no logs.
    async fn transaction_logs(&self, hash: B256) -> Result<Option<Vec<RpcLog>>, RpcError>;

    /// Get logs matching a filter.
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RpcLog>, RpcError>;

    /// Get code at an address as of the referenced block.
    async fn code(&self, address: Address, block: BlockId) -> Result<Option<Bytes>, RpcError>;
}

/// The RPC server implementation.
pub struct EthRpcServer<P: QueryApi> {
    provider: Arc<P>,
}

impl<P: QueryApi> EthRpcServer<P> {
    /// Create a new RPC server delegating to the given query provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

#[async_trait]
impl<P: QueryApi> EthApiServer for EthRpcServer<P> {
    async fn block_number(&self) -> Result<U64, ErrorObjectOwned> {
        let height = self
            .provider
            .latest_height()
            .await
            .map_err(ErrorObjectOwned::from)?;
        Ok(U64::from(height))
    }

    async fn get_block_by_number(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned> {
        self.provider
            .block_by_number(block, full_transactions)
            .await
            .map_err(|e| e.into())
    }

    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned> {
        self.provider
            .block_by_hash(hash, full_transactions)
            .await
            .map_err(|e| e.into())
    }

    async fn get_block_transaction_count_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        let count = self
            .provider
            .block_transaction_count_by_number(block)
            .await
            .map_err(ErrorObjectOwned::from)?;
        Ok(count.map(U64::from))
    }

    async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        let count = self
            .provider
            .block_transaction_count_by_hash(hash)
            .await
            .map_err(ErrorObjectOwned::from)?;
        Ok(count.map(U64::from))
    }

    async fn get_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned> {
        self.provider
            .transaction_by_block_hash_and_index(hash, index.to::<u64>())
            .await
            .map_err(|e| e.into())
    }

    async fn get_transaction_by_block_number_and_index(
        &self,
        block: BlockNumberOrTag,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned> {
        self.provider
            .transaction_by_block_number_and_index(block, index.to::<u64>())
            .await
            .map_err(|e| e.into())
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RpcReceipt>, ErrorObjectOwned> {
        self.provider
            .transaction_receipt(hash)
            .await
            .map_err(|e| e.into())
    }

    async fn get_transaction_logs(
        &self,
        hash: B256,
    ) -> Result<Option<Vec<RpcLog>>, ErrorObjectOwned> {
        self.provider
            .transaction_logs(hash)
            .await
            .map_err(|e| e.into())
    }

    async fn get_logs(&self, filter: LogFilter) -> Result<Vec<RpcLog>, ErrorObjectOwned> {
        self.provider.logs(&filter).await.map_err(|e| e.into())
    }

    async fn get_code(
        &self,
        address: Address,
        block: BlockId,
    ) -> Result<Option<Bytes>, ErrorObjectOwned> {
        self.provider.code(address, block).await.map_err(|e| e.into())
    }
}

// Need Clone for the RPC server to be used in multiple places
impl<P: QueryApi> Clone for EthRpcServer<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

/// Start the RPC server with the given provider.
///
/// Returns a handle that keeps the server alive until stopped or dropped.
pub async fn start_server<P: QueryApi>(
    config: RpcServerConfig,
    provider: P,
) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::builder().build(config.http_addr).await?;
    let addr = server.local_addr()?;

    let eth_rpc = EthRpcServer::new(provider);
    let mut module = RpcModule::new(());
    module.merge(EthApiServer::into_rpc(eth_rpc))?;

    let handle = server.start(module);
    tracing::info!("RPC server listening on {}", addr);
    Ok(handle)
}
