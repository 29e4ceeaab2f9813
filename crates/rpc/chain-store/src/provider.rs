//! Query provider wiring the store and cache to the RPC surface.
//!
//! `ChainQueryProvider` implements `chainquery_eth_jsonrpc::QueryApi` on top
//! of a [`ChainStore`] and a [`KvCache`]. It owns the method semantics: tag
//! resolution, filter defaulting, topic matching, and the per-method error
//! policy (which failures soften to `null` and which surface as errors).

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use chainquery_eth_jsonrpc::{QueryApi, RpcError};
use chainquery_rpc_types::{
    BlockId, BlockNumberOrTag, LogFilter, RpcBlock, RpcLog, RpcReceipt, RpcTransaction,
};

use crate::cache::{IndexTask, KvCache, LATEST_TASK_KEY};
use crate::error::StoreError;
use crate::filter::matches_topics;
use crate::store::ChainStore;
use crate::types::StoredBlock;

/// Provider serving Ethereum-compatible queries from indexed chain data.
pub struct ChainQueryProvider<S, C> {
    store: S,
    cache: C,
}

impl<S: ChainStore, C: KvCache> ChainQueryProvider<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    /// Latest indexed height from the cache.
    ///
    /// Fails open: a cache outage, missing record, or undecodable record all
    /// resolve to height 0 so reads keep working against the store.
    fn resolved_latest(&self) -> u64 {
        let raw = match self.cache.get(LATEST_TASK_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("no latest task record in cache, using height 0");
                return 0;
            }
            Err(e) => {
                tracing::warn!("cache read for latest height failed: {e}, using height 0");
                return 0;
            }
        };
        match serde_json::from_slice::<IndexTask>(&raw) {
            Ok(task) => task.height,
            Err(e) => {
                tracing::warn!("undecodable latest task record: {e}, using height 0");
                0
            }
        }
    }

    /// Resolve a number-or-tag to a concrete height.
    ///
    /// Tags and the literal number 0 both mean "latest". `cached` holds the
    /// latest height once computed so a single call reads the cache at most
    /// once.
    fn resolve(&self, block: BlockNumberOrTag, cached: &mut Option<u64>) -> u64 {
        match block.as_number() {
            Some(number) if number > 0 => number,
            _ => *cached.get_or_insert_with(|| self.resolved_latest()),
        }
    }

    /// Fetch a block, softening store failures to `None`.
    fn fetch_block_by_number(&self, number: u64) -> Option<StoredBlock> {
        match self.store.block_by_number(number) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!("block lookup for number {number} failed: {e}");
                None
            }
        }
    }

    /// Fetch a block by hash, softening store failures to `None`.
    fn fetch_block_by_hash(&self, hash: B256) -> Option<StoredBlock> {
        match self.store.block_by_hash(hash) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!("block lookup for hash {hash} failed: {e}");
                None
            }
        }
    }

    fn transaction_at_index(
        &self,
        block: Option<StoredBlock>,
        index: u64,
    ) -> Result<Option<RpcTransaction>, RpcError> {
        let Some(block) = block else {
            return Ok(None);
        };
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        match block.transactions.get(index) {
            Some(tx) => Ok(Some(
                tx.to_rpc_transaction(block.number, block.hash)
                    .map_err(internal)?,
            )),
            None => Ok(None),
        }
    }
}

fn internal(err: StoreError) -> RpcError {
    RpcError::InternalError(err.to_string())
}

#[async_trait]
impl<S, C> QueryApi for ChainQueryProvider<S, C>
where
    S: ChainStore + 'static,
    C: KvCache + 'static,
{
    async fn latest_height(&self) -> Result<u64, RpcError> {
        Ok(self.resolved_latest())
    }

    async fn block_by_number(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, RpcError> {
        let number = self.resolve(block, &mut None);
        match self.fetch_block_by_number(number) {
            Some(block) => Ok(Some(block.to_rpc_block(full_transactions).map_err(internal)?)),
            None => Ok(None),
        }
    }

    async fn block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, RpcError> {
        match self.fetch_block_by_hash(hash) {
            Some(block) => Ok(Some(block.to_rpc_block(full_transactions).map_err(internal)?)),
            None => Ok(None),
        }
    }

    async fn block_transaction_count_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<u64>, RpcError> {
        let number = self.resolve(block, &mut None);
        Ok(self
            .fetch_block_by_number(number)
            .map(|b| b.transactions.len() as u64))
    }

    async fn block_transaction_count_by_hash(&self, hash: B256) -> Result<Option<u64>, RpcError> {
        Ok(self
            .fetch_block_by_hash(hash)
            .map(|b| b.transactions.len() as u64))
    }

    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: u64,
    ) -> Result<Option<RpcTransaction>, RpcError> {
        self.transaction_at_index(self.fetch_block_by_hash(hash), index)
    }

    async fn transaction_by_block_number_and_index(
        &self,
        block: BlockNumberOrTag,
        index: u64,
    ) -> Result<Option<RpcTransaction>, RpcError> {
        let number = self.resolve(block, &mut None);
        self.transaction_at_index(self.fetch_block_by_number(number), index)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, RpcError> {
        let receipts = self.store.receipts_by_tx_hash(hash).map_err(internal)?;
        // First row wins if the store holds duplicates
        match receipts.first() {
            Some(receipt) => Ok(Some(receipt.to_rpc_receipt().map_err(internal)?)),
            None => Ok(None),
        }
    }

    async fn transaction_logs(&self, hash: B256) -> Result<Option<Vec<RpcLog>>, RpcError> {
        let receipts = self.store.receipts_by_tx_hash(hash).map_err(internal)?;
        let Some(receipt) = receipts.first() else {
            return Err(RpcError::TransactionNotFound);
        };
        if receipt.logs.is_empty() {
            return Ok(None);
        }
        let mut logs = Vec::with_capacity(receipt.logs.len());
        for log in &receipt.logs {
            logs.push(log.to_rpc_log().map_err(internal)?);
        }
        Ok(Some(logs))
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RpcLog>, RpcError> {
        let addresses = filter.addresses();

        let rows = if let Some(hash) = filter.block_hash {
            // A block hash overrides any range in the filter
            self.store
                .logs_by_block_hash(hash, &addresses)
                .map_err(internal)?
        } else {
            let mut latest = None;
            let from = match filter.from_block {
                Some(block) => self.resolve(block, &mut latest),
                None => self.resolve(BlockNumberOrTag::default(), &mut latest),
            };
            let to = match filter.to_block {
                Some(block) => self.resolve(block, &mut latest),
                None => from,
            };
            self.store
                .logs_by_range(from, to, &addresses)
                .map_err(internal)?
        };

        let matrix = filter.topic_matrix();
        let mut logs = Vec::new();
        for row in rows {
            if matches_topics(&row.topics, &matrix) {
                logs.push(row.to_rpc_log().map_err(internal)?);
            }
        }
        Ok(logs)
    }

    async fn code(&self, address: Address, block: BlockId) -> Result<Option<Bytes>, RpcError> {
        let reference = if let Some(number) = block.number() {
            self.resolve(number, &mut None)
        } else if let Some(hash) = block.hash() {
            match self.fetch_block_by_hash(hash) {
                Some(block) => block.number,
                None => return Err(RpcError::HeaderNotFound),
            }
        } else {
            return Err(RpcError::InvalidParams(
                "invalid arguments; neither block nor hash specified".to_string(),
            ));
        };

        let code = match self.store.code_by_address(address) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!("code lookup for {address} failed: {e}");
                return Ok(None);
            }
        };
        let Some(code) = code else {
            return Ok(None);
        };
        // The code observation postdates the referenced block
        if code.block_number > reference {
            return Ok(None);
        }
        Ok(Some(code.decoded().map_err(internal)?))
    }
}
