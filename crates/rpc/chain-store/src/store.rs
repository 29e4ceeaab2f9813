//! Store trait and SQLite-backed implementation.
//!
//! `ChainStore` defines the read operations the query core needs.
//! `SqliteChainStore` implements it over a SQLite database with a connection
//! pool (r2d2) for concurrent reads and a dedicated writer connection for the
//! ingestion seam.

use std::sync::Mutex;

use alloy_primitives::{Address, B256};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};

use crate::cache::{IndexTask, KvCache, LATEST_TASK_KEY};
use crate::error::{CacheError, StoreError, StoreResult};
use crate::types::{StoredBlock, StoredCode, StoredLog, StoredReceipt, StoredTransaction};

/// Hard cap on rows returned by a single log query.
pub const MAX_LOG_ROWS: usize = 10_000;

/// Trait for reading indexed chain data.
///
/// All methods are synchronous to avoid Send bound issues with the storage
/// layer; the async provider wraps them.
pub trait ChainStore: Send + Sync {
    /// All receipt rows recorded for a transaction hash, in insertion order.
    ///
    /// A consistent store has at most one; duplicates are surfaced so the
    /// caller can decide (first row wins).
    fn receipts_by_tx_hash(&self, hash: B256) -> StoreResult<Vec<StoredReceipt>>;

    /// Logs in an inclusive block range, optionally restricted to a set of
    /// emitting addresses (empty = any). Capped at [`MAX_LOG_ROWS`].
    fn logs_by_range(&self, from: u64, to: u64, addresses: &[Address])
        -> StoreResult<Vec<StoredLog>>;

    /// Logs of a single block identified by hash, same address filtering.
    fn logs_by_block_hash(&self, hash: B256, addresses: &[Address])
        -> StoreResult<Vec<StoredLog>>;

    /// Get a block with its ordered transactions by number.
    fn block_by_number(&self, number: u64) -> StoreResult<Option<StoredBlock>>;

    /// Get a block with its ordered transactions by hash.
    fn block_by_hash(&self, hash: B256) -> StoreResult<Option<StoredBlock>>;

    /// Latest recorded code observation for an address.
    fn code_by_address(&self, address: Address) -> StoreResult<Option<StoredCode>>;
}

impl<T: ChainStore + ?Sized> ChainStore for std::sync::Arc<T> {
    fn receipts_by_tx_hash(&self, hash: B256) -> StoreResult<Vec<StoredReceipt>> {
        (**self).receipts_by_tx_hash(hash)
    }

    fn logs_by_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> StoreResult<Vec<StoredLog>> {
        (**self).logs_by_range(from, to, addresses)
    }

    fn logs_by_block_hash(&self, hash: B256, addresses: &[Address]) -> StoreResult<Vec<StoredLog>> {
        (**self).logs_by_block_hash(hash, addresses)
    }

    fn block_by_number(&self, number: u64) -> StoreResult<Option<StoredBlock>> {
        (**self).block_by_number(number)
    }

    fn block_by_hash(&self, hash: B256) -> StoreResult<Option<StoredBlock>> {
        (**self).block_by_hash(hash)
    }

    fn code_by_address(&self, address: Address) -> StoreResult<Option<StoredCode>> {
        (**self).code_by_address(address)
    }
}

/// Chain store backed by SQLite.
///
/// Uses a read pool for query traffic and a dedicated writer connection for
/// the ingestion seam. WAL mode lets readers proceed without blocking the
/// writer and vice versa.
pub struct SqliteChainStore {
    /// Connection pool for read operations (concurrent).
    read_pool: Pool<SqliteConnectionManager>,
    /// Dedicated connection for write operations (serialized).
    writer: Mutex<Connection>,
}

/// Configure a connection with standard PRAGMAs for WAL mode.
fn configure_connection(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;",
    )
}

impl SqliteChainStore {
    /// Open or create an on-disk store.
    pub fn new(db_path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let writer = Connection::open(&db_path)?;
        configure_connection(&writer)?;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_flags(
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_init(|conn| configure_connection(conn));
        let read_pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;

        let store = Self {
            read_pool,
            writer: Mutex::new(writer),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// In-memory SQLite DBs are per-connection, so a named shared-cache URI
    /// makes the pool and the writer see the same data.
    pub fn in_memory() -> StoreResult<Self> {
        let uri = format!("file:store_{}?mode=memory&cache=shared", unique_id());
        let writer = Connection::open(&uri)?;
        configure_connection(&writer)?;

        let manager =
            SqliteConnectionManager::file(&uri).with_init(|conn| configure_connection(conn));
        let read_pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;

        let store = Self {
            read_pool,
            writer: Mutex::new(writer),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn read_conn(&self) -> StoreResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.read_pool
            .get()
            .map_err(|e| StoreError::Sqlite(e.to_string()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.writer.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blocks (
                 number INTEGER PRIMARY KEY,
                 hash BLOB NOT NULL UNIQUE,
                 parent_hash BLOB NOT NULL,
                 state_root BLOB NOT NULL,
                 transactions_root BLOB NOT NULL,
                 miner BLOB NOT NULL,
                 size INTEGER NOT NULL,
                 gas_limit INTEGER NOT NULL,
                 gas_used TEXT NOT NULL,
                 timestamp INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_blocks_hash ON blocks(hash);

             CREATE TABLE IF NOT EXISTS transactions (
                 hash BLOB PRIMARY KEY,
                 block_number INTEGER NOT NULL,
                 transaction_index INTEGER NOT NULL,
                 from_addr BLOB NOT NULL,
                 to_addr BLOB,
                 gas INTEGER NOT NULL,
                 gas_price TEXT NOT NULL,
                 nonce INTEGER NOT NULL,
                 value TEXT NOT NULL,
                 v TEXT NOT NULL,
                 r TEXT NOT NULL,
                 s TEXT NOT NULL,
                 input TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_tx_block ON transactions(block_number);

             CREATE TABLE IF NOT EXISTS receipts (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 transaction_hash BLOB NOT NULL,
                 status INTEGER NOT NULL,
                 cumulative_gas_used INTEGER NOT NULL,
                 gas_used INTEGER NOT NULL,
                 block_hash BLOB NOT NULL,
                 block_number INTEGER NOT NULL,
                 transaction_index INTEGER NOT NULL,
                 from_addr BLOB NOT NULL,
                 to_addr BLOB,
                 contract_address BLOB
             );
             CREATE INDEX IF NOT EXISTS idx_receipts_tx ON receipts(transaction_hash);

             CREATE TABLE IF NOT EXISTS logs (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 address BLOB NOT NULL,
                 topics BLOB NOT NULL,
                 data TEXT NOT NULL,
                 block_number INTEGER NOT NULL,
                 block_hash BLOB NOT NULL,
                 transaction_hash BLOB NOT NULL,
                 transaction_index INTEGER NOT NULL,
                 log_index INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_logs_block ON logs(block_number);
             CREATE INDEX IF NOT EXISTS idx_logs_block_hash ON logs(block_hash);
             CREATE INDEX IF NOT EXISTS idx_logs_address ON logs(address);
             CREATE INDEX IF NOT EXISTS idx_logs_tx ON logs(transaction_hash);

             CREATE TABLE IF NOT EXISTS codes (
                 address BLOB PRIMARY KEY,
                 code TEXT NOT NULL,
                 block_number INTEGER NOT NULL
             );

             CREATE TABLE IF NOT EXISTS metadata (
                 key TEXT PRIMARY KEY,
                 value BLOB NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Ingestion seam: store a block and its transactions.
    pub fn put_block(&self, block: &StoredBlock) -> StoreResult<()> {
        let mut conn = self.writer.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM transactions WHERE block_number = ?",
            params![block.number as i64],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO blocks
             (number, hash, parent_hash, state_root, transactions_root, miner,
              size, gas_limit, gas_used, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                block.number as i64,
                block.hash.as_slice(),
                block.parent_hash.as_slice(),
                block.state_root.as_slice(),
                block.transactions_root.as_slice(),
                block.miner.as_slice(),
                block.size as i64,
                block.gas_limit as i64,
                block.gas_used,
                block.timestamp as i64,
            ],
        )?;

        for transaction in &block.transactions {
            insert_transaction(&tx, block.number, transaction)?;
        }

        tx.commit()?;
        tracing::debug!("stored block {} with hash {:?}", block.number, block.hash);
        Ok(())
    }

    /// Ingestion seam: store a receipt and its logs.
    pub fn put_receipt(&self, receipt: &StoredReceipt) -> StoreResult<()> {
        let mut conn = self.writer.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO receipts
             (transaction_hash, status, cumulative_gas_used, gas_used, block_hash,
              block_number, transaction_index, from_addr, to_addr, contract_address)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                receipt.transaction_hash.as_slice(),
                receipt.status as i64,
                receipt.cumulative_gas_used as i64,
                receipt.gas_used as i64,
                receipt.block_hash.as_slice(),
                receipt.block_number as i64,
                receipt.transaction_index as i64,
                receipt.from.as_slice(),
                receipt.to.as_ref().map(|a| a.as_slice()),
                receipt.contract_address.as_ref().map(|a| a.as_slice()),
            ],
        )?;

        for log in &receipt.logs {
            insert_log(&tx, log)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Ingestion seam: record a code observation.
    pub fn put_code(&self, code: &StoredCode) -> StoreResult<()> {
        let conn = self.writer.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO codes (address, code, block_number) VALUES (?, ?, ?)",
            params![
                code.address.as_slice(),
                code.code,
                code.block_number as i64
            ],
        )?;
        Ok(())
    }

    /// Ingestion seam: record the latest indexed height task.
    pub fn put_latest_task(&self, height: u64) -> StoreResult<()> {
        let bytes = serde_json::to_vec(&IndexTask { height })?;
        let conn = self.writer.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)",
            params![LATEST_TASK_KEY, bytes],
        )?;
        Ok(())
    }

    fn transactions_of_block(
        conn: &Connection,
        number: u64,
    ) -> StoreResult<Vec<StoredTransaction>> {
        let mut stmt = conn.prepare(
            "SELECT hash, transaction_index, from_addr, to_addr, gas, gas_price,
                    nonce, value, v, r, s, input
             FROM transactions WHERE block_number = ? ORDER BY transaction_index",
        )?;
        let txs: rusqlite::Result<Vec<StoredTransaction>> = stmt
            .query_map(params![number as i64], row_to_stored_transaction)?
            .collect();
        Ok(txs?)
    }

    fn block_row(&self, conn: &Connection, sql: &str, param: SqlValue) -> StoreResult<Option<StoredBlock>> {
        let result = conn.query_row(sql, params![param], row_to_stored_block);
        match result {
            Ok(mut block) => {
                block.transactions = Self::transactions_of_block(conn, block.number)?;
                Ok(Some(block))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_logs(
        &self,
        base_predicate: &str,
        mut params: Vec<SqlValue>,
        addresses: &[Address],
    ) -> StoreResult<Vec<StoredLog>> {
        let mut sql = format!(
            "SELECT address, topics, data, block_number, block_hash, transaction_hash,
                    transaction_index, log_index
             FROM logs WHERE {base_predicate}"
        );

        // Query-planning branches for the address filter: none, equality,
        // or set membership. All three produce the same result set shape.
        match addresses.len() {
            0 => {}
            1 => {
                sql.push_str(" AND address = ?");
                params.push(SqlValue::Blob(addresses[0].as_slice().to_vec()));
            }
            n => {
                sql.push_str(" AND address IN (");
                sql.push_str(&vec!["?"; n].join(","));
                sql.push(')');
                for address in addresses {
                    params.push(SqlValue::Blob(address.as_slice().to_vec()));
                }
            }
        }

        sql.push_str(" ORDER BY block_number, log_index LIMIT ");
        sql.push_str(&MAX_LOG_ROWS.to_string());

        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let logs: rusqlite::Result<Vec<StoredLog>> = stmt
            .query_map(rusqlite::params_from_iter(params), row_to_stored_log)?
            .collect();
        Ok(logs?)
    }
}

impl ChainStore for SqliteChainStore {
    fn receipts_by_tx_hash(&self, hash: B256) -> StoreResult<Vec<StoredReceipt>> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(
            "SELECT transaction_hash, status, cumulative_gas_used, gas_used, block_hash,
                    block_number, transaction_index, from_addr, to_addr, contract_address
             FROM receipts WHERE transaction_hash = ? ORDER BY id",
        )?;
        let receipts: rusqlite::Result<Vec<StoredReceipt>> = stmt
            .query_map(params![hash.as_slice()], row_to_stored_receipt)?
            .collect();
        let mut receipts = receipts?;

        if !receipts.is_empty() {
            let mut log_stmt = conn.prepare(
                "SELECT address, topics, data, block_number, block_hash, transaction_hash,
                        transaction_index, log_index
                 FROM logs WHERE transaction_hash = ? ORDER BY log_index",
            )?;
            let logs: rusqlite::Result<Vec<StoredLog>> = log_stmt
                .query_map(params![hash.as_slice()], row_to_stored_log)?
                .collect();
            let logs = logs?;
            for receipt in &mut receipts {
                receipt.logs = logs.clone();
            }
        }

        Ok(receipts)
    }

    fn logs_by_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> StoreResult<Vec<StoredLog>> {
        self.query_logs(
            "block_number >= ? AND block_number <= ?",
            vec![SqlValue::from(from as i64), SqlValue::from(to as i64)],
            addresses,
        )
    }

    fn logs_by_block_hash(&self, hash: B256, addresses: &[Address]) -> StoreResult<Vec<StoredLog>> {
        self.query_logs(
            "block_hash = ?",
            vec![SqlValue::Blob(hash.as_slice().to_vec())],
            addresses,
        )
    }

    fn block_by_number(&self, number: u64) -> StoreResult<Option<StoredBlock>> {
        let conn = self.read_conn()?;
        self.block_row(
            &conn,
            "SELECT number, hash, parent_hash, state_root, transactions_root, miner,
                    size, gas_limit, gas_used, timestamp
             FROM blocks WHERE number = ?",
            SqlValue::from(number as i64),
        )
    }

    fn block_by_hash(&self, hash: B256) -> StoreResult<Option<StoredBlock>> {
        let conn = self.read_conn()?;
        self.block_row(
            &conn,
            "SELECT number, hash, parent_hash, state_root, transactions_root, miner,
                    size, gas_limit, gas_used, timestamp
             FROM blocks WHERE hash = ?",
            SqlValue::Blob(hash.as_slice().to_vec()),
        )
    }

    fn code_by_address(&self, address: Address) -> StoreResult<Option<StoredCode>> {
        let conn = self.read_conn()?;
        let result = conn.query_row(
            "SELECT address, code, block_number FROM codes WHERE address = ?",
            params![address.as_slice()],
            row_to_stored_code,
        );
        match result {
            Ok(code) => Ok(Some(code)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// The daemon reads the latest-height task from the same database the
/// ingestion pipeline writes it to.
impl KvCache for SqliteChainStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let conn = self
            .read_conn()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let result: rusqlite::Result<Vec<u8>> = conn.query_row(
            "SELECT value FROM metadata WHERE key = ?",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CacheError::Backend(e.to_string())),
        }
    }
}

fn insert_transaction(
    tx: &rusqlite::Transaction<'_>,
    block_number: u64,
    transaction: &StoredTransaction,
) -> StoreResult<()> {
    tx.execute(
        "INSERT OR REPLACE INTO transactions
         (hash, block_number, transaction_index, from_addr, to_addr, gas, gas_price,
          nonce, value, v, r, s, input)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            transaction.hash.as_slice(),
            block_number as i64,
            transaction.transaction_index as i64,
            transaction.from.as_slice(),
            transaction.to.as_ref().map(|a| a.as_slice()),
            transaction.gas as i64,
            transaction.gas_price,
            transaction.nonce as i64,
            transaction.value,
            transaction.v,
            transaction.r,
            transaction.s,
            transaction.input,
        ],
    )?;
    Ok(())
}

fn insert_log(tx: &rusqlite::Transaction<'_>, log: &StoredLog) -> StoreResult<()> {
    let topics_json = serde_json::to_vec(&log.topics)?;
    tx.execute(
        "INSERT INTO logs
         (address, topics, data, block_number, block_hash, transaction_hash,
          transaction_index, log_index)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            log.address.as_slice(),
            topics_json,
            log.data,
            log.block_number as i64,
            log.block_hash.as_slice(),
            log.transaction_hash.as_slice(),
            log.transaction_index as i64,
            log.log_index as i64,
        ],
    )?;
    Ok(())
}

fn row_to_stored_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredBlock> {
    let number: i64 = row.get(0)?;
    let hash_bytes: Vec<u8> = row.get(1)?;
    let parent_hash_bytes: Vec<u8> = row.get(2)?;
    let state_root_bytes: Vec<u8> = row.get(3)?;
    let transactions_root_bytes: Vec<u8> = row.get(4)?;
    let miner_bytes: Vec<u8> = row.get(5)?;
    let size: i64 = row.get(6)?;
    let gas_limit: i64 = row.get(7)?;
    let gas_used: String = row.get(8)?;
    let timestamp: i64 = row.get(9)?;

    Ok(StoredBlock {
        number: number as u64,
        hash: b256_from_row(&hash_bytes, 1)?,
        parent_hash: b256_from_row(&parent_hash_bytes, 2)?,
        state_root: b256_from_row(&state_root_bytes, 3)?,
        transactions_root: b256_from_row(&transactions_root_bytes, 4)?,
        miner: address_from_row(&miner_bytes, 5)?,
        size: size as u64,
        gas_limit: gas_limit as u64,
        gas_used,
        timestamp: timestamp as u64,
        transactions: vec![], // attached by the caller
    })
}

fn row_to_stored_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredTransaction> {
    let hash_bytes: Vec<u8> = row.get(0)?;
    let transaction_index: i64 = row.get(1)?;
    let from_bytes: Vec<u8> = row.get(2)?;
    let to_bytes: Option<Vec<u8>> = row.get(3)?;
    let gas: i64 = row.get(4)?;
    let gas_price: String = row.get(5)?;
    let nonce: i64 = row.get(6)?;
    let value: String = row.get(7)?;
    let v: String = row.get(8)?;
    let r: String = row.get(9)?;
    let s: String = row.get(10)?;
    let input: String = row.get(11)?;

    let to = to_bytes
        .as_deref()
        .map(|b| address_from_row(b, 3))
        .transpose()?;

    Ok(StoredTransaction {
        hash: b256_from_row(&hash_bytes, 0)?,
        transaction_index: transaction_index as u32,
        from: address_from_row(&from_bytes, 2)?,
        to,
        gas: gas as u64,
        gas_price,
        nonce: nonce as u64,
        value,
        v,
        r,
        s,
        input,
    })
}

fn row_to_stored_receipt(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredReceipt> {
    let transaction_hash_bytes: Vec<u8> = row.get(0)?;
    let status: i64 = row.get(1)?;
    let cumulative_gas_used: i64 = row.get(2)?;
    let gas_used: i64 = row.get(3)?;
    let block_hash_bytes: Vec<u8> = row.get(4)?;
    let block_number: i64 = row.get(5)?;
    let transaction_index: i64 = row.get(6)?;
    let from_bytes: Vec<u8> = row.get(7)?;
    let to_bytes: Option<Vec<u8>> = row.get(8)?;
    let contract_address_bytes: Option<Vec<u8>> = row.get(9)?;

    let to = to_bytes
        .as_deref()
        .map(|b| address_from_row(b, 8))
        .transpose()?;
    let contract_address = contract_address_bytes
        .as_deref()
        .map(|b| address_from_row(b, 9))
        .transpose()?;

    Ok(StoredReceipt {
        transaction_hash: b256_from_row(&transaction_hash_bytes, 0)?,
        status: status as u64,
        cumulative_gas_used: cumulative_gas_used as u64,
        gas_used: gas_used as u64,
        block_hash: b256_from_row(&block_hash_bytes, 4)?,
        block_number: block_number as u64,
        transaction_index: transaction_index as u32,
        from: address_from_row(&from_bytes, 7)?,
        to,
        contract_address,
        logs: vec![], // attached by the caller
    })
}

fn row_to_stored_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredLog> {
    let address_bytes: Vec<u8> = row.get(0)?;
    let topics_json: Vec<u8> = row.get(1)?;
    let data: String = row.get(2)?;
    let block_number: i64 = row.get(3)?;
    let block_hash_bytes: Vec<u8> = row.get(4)?;
    let transaction_hash_bytes: Vec<u8> = row.get(5)?;
    let transaction_index: i64 = row.get(6)?;
    let log_index: i64 = row.get(7)?;

    let topics: Vec<B256> = serde_json::from_slice(&topics_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Blob, Box::new(e))
    })?;

    Ok(StoredLog {
        address: address_from_row(&address_bytes, 0)?,
        topics,
        data,
        block_number: block_number as u64,
        block_hash: b256_from_row(&block_hash_bytes, 4)?,
        transaction_hash: b256_from_row(&transaction_hash_bytes, 5)?,
        transaction_index: transaction_index as u32,
        log_index: log_index as u64,
    })
}

fn row_to_stored_code(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCode> {
    let address_bytes: Vec<u8> = row.get(0)?;
    let code: String = row.get(1)?;
    let block_number: i64 = row.get(2)?;

    Ok(StoredCode {
        address: address_from_row(&address_bytes, 0)?,
        code,
        block_number: block_number as u64,
    })
}

/// Generate a unique ID for in-memory shared-cache SQLite databases.
fn unique_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

fn b256_from_row(bytes: &[u8], col: usize) -> rusqlite::Result<B256> {
    if bytes.len() != 32 {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Blob,
            format!("expected 32 bytes for B256, got {}", bytes.len()).into(),
        ));
    }
    Ok(B256::from_slice(bytes))
}

fn address_from_row(bytes: &[u8], col: usize) -> rusqlite::Result<Address> {
    if bytes.len() != 20 {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Blob,
            format!("expected 20 bytes for Address, got {}", bytes.len()).into(),
        ));
    }
    Ok(Address::from_slice(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_block(number: u64, tx_count: u32) -> StoredBlock {
        StoredBlock {
            number,
            hash: B256::repeat_byte(number as u8),
            parent_hash: if number > 0 {
                B256::repeat_byte((number - 1) as u8)
            } else {
                B256::ZERO
            },
            state_root: B256::repeat_byte(0xaa),
            transactions_root: B256::repeat_byte(0xbb),
            miner: Address::repeat_byte(0xdd),
            size: 1024,
            gas_limit: 30_000_000,
            gas_used: "0x5208".to_string(),
            timestamp: 1000 + number * 12,
            transactions: (0..tx_count)
                .map(|i| make_transaction(number, i))
                .collect(),
        }
    }

    fn make_transaction(block_number: u64, index: u32) -> StoredTransaction {
        StoredTransaction {
            hash: tx_hash(block_number, index),
            transaction_index: index,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
            gas: 21_000,
            gas_price: "0x1".to_string(),
            nonce: index as u64,
            value: "0x64".to_string(),
            v: "0x1b".to_string(),
            r: "0x1".to_string(),
            s: "0x2".to_string(),
            input: "0x".to_string(),
        }
    }

    fn tx_hash(block_number: u64, index: u32) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[0..8].copy_from_slice(&block_number.to_be_bytes());
        bytes[8..12].copy_from_slice(&index.to_be_bytes());
        B256::from(bytes)
    }

    fn make_receipt(block_number: u64, index: u32, log_count: u64) -> StoredReceipt {
        let hash = tx_hash(block_number, index);
        StoredReceipt {
            transaction_hash: hash,
            status: 1,
            cumulative_gas_used: 21_000 * (index as u64 + 1),
            gas_used: 21_000,
            block_hash: B256::repeat_byte(block_number as u8),
            block_number,
            transaction_index: index,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
            contract_address: None,
            logs: (0..log_count)
                .map(|i| make_log(block_number, index, i, Address::repeat_byte(0x70)))
                .collect(),
        }
    }

    fn make_log(block_number: u64, tx_index: u32, log_index: u64, address: Address) -> StoredLog {
        StoredLog {
            address,
            topics: vec![B256::repeat_byte(0x0a), B256::repeat_byte(0x0b)],
            data: "0x01".to_string(),
            block_number,
            block_hash: B256::repeat_byte(block_number as u8),
            transaction_hash: tx_hash(block_number, tx_index),
            transaction_index: tx_index,
            log_index,
        }
    }

    #[test]
    fn test_block_roundtrip_preserves_transaction_order() {
        let store = SqliteChainStore::in_memory().unwrap();
        let block = make_block(5, 4);
        store.put_block(&block).unwrap();

        let by_number = store.block_by_number(5).unwrap().unwrap();
        assert_eq!(by_number.hash, block.hash);
        assert_eq!(by_number.gas_used, "0x5208");
        let indexes: Vec<u32> = by_number
            .transactions
            .iter()
            .map(|t| t.transaction_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);

        let by_hash = store.block_by_hash(block.hash).unwrap().unwrap();
        assert_eq!(by_hash.number, 5);
        assert_eq!(by_hash.transactions.len(), 4);

        assert!(store.block_by_number(99).unwrap().is_none());
        assert!(store
            .block_by_hash(B256::repeat_byte(0xff))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_receipt_rows_surface_in_insertion_order() {
        let store = SqliteChainStore::in_memory().unwrap();
        let first = make_receipt(3, 0, 1);
        let mut second = make_receipt(3, 0, 1);
        second.status = 0;

        store.put_receipt(&first).unwrap();
        store.put_receipt(&second).unwrap();

        let rows = store.receipts_by_tx_hash(first.transaction_hash).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, 1);
        assert_eq!(rows[1].status, 0);
    }

    #[test]
    fn test_receipt_logs_attached_in_order() {
        let store = SqliteChainStore::in_memory().unwrap();
        let receipt = make_receipt(4, 1, 3);
        store.put_receipt(&receipt).unwrap();

        let rows = store.receipts_by_tx_hash(receipt.transaction_hash).unwrap();
        assert_eq!(rows.len(), 1);
        let log_indexes: Vec<u64> = rows[0].logs.iter().map(|l| l.log_index).collect();
        assert_eq!(log_indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_log_range_and_address_branches_agree() {
        let store = SqliteChainStore::in_memory().unwrap();
        let target = Address::repeat_byte(0x70);
        let other = Address::repeat_byte(0x71);

        for block_number in 1..=3u64 {
            let mut receipt = make_receipt(block_number, 0, 0);
            receipt.logs = vec![
                make_log(block_number, 0, 0, target),
                make_log(block_number, 0, 1, other),
            ];
            store.put_receipt(&receipt).unwrap();
        }

        let all = store.logs_by_range(1, 3, &[]).unwrap();
        assert_eq!(all.len(), 6);
        // Ordered by block number then log index
        let positions: Vec<(u64, u64)> = all.iter().map(|l| (l.block_number, l.log_index)).collect();
        assert_eq!(
            positions,
            vec![(1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)]
        );

        let single = store.logs_by_range(1, 3, &[target]).unwrap();
        assert_eq!(single.len(), 3);
        assert!(single.iter().all(|l| l.address == target));

        // The set-membership branch with one extra address covering the same
        // rows returns the identical result set.
        let multi = store
            .logs_by_range(1, 3, &[target, Address::repeat_byte(0x7f)])
            .unwrap();
        assert_eq!(multi.len(), single.len());
        for (a, b) in single.iter().zip(multi.iter()) {
            assert_eq!(a.transaction_hash, b.transaction_hash);
            assert_eq!(a.log_index, b.log_index);
        }

        let by_hash = store
            .logs_by_block_hash(B256::repeat_byte(2), &[target])
            .unwrap();
        assert_eq!(by_hash.len(), 1);
        assert_eq!(by_hash[0].block_number, 2);

        assert!(store
            .logs_by_block_hash(B256::repeat_byte(0xee), &[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_log_query_row_cap() {
        let store = SqliteChainStore::in_memory().unwrap();
        let receipt = make_receipt(1, 0, MAX_LOG_ROWS as u64 + 5);
        store.put_receipt(&receipt).unwrap();

        let logs = store.logs_by_range(1, 1, &[]).unwrap();
        assert_eq!(logs.len(), MAX_LOG_ROWS);
    }

    #[test]
    fn test_code_roundtrip() {
        let store = SqliteChainStore::in_memory().unwrap();
        let address = Address::repeat_byte(0x42);
        store
            .put_code(&StoredCode {
                address,
                code: "0x6001".to_string(),
                block_number: 10,
            })
            .unwrap();

        let code = store.code_by_address(address).unwrap().unwrap();
        assert_eq!(code.code, "0x6001");
        assert_eq!(code.block_number, 10);

        assert!(store
            .code_by_address(Address::repeat_byte(0x43))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_latest_task_readable_through_kv_cache() {
        let store = SqliteChainStore::in_memory().unwrap();
        assert!(KvCache::get(&store, LATEST_TASK_KEY).unwrap().is_none());

        store.put_latest_task(77).unwrap();
        let bytes = KvCache::get(&store, LATEST_TASK_KEY).unwrap().unwrap();
        let task: IndexTask = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(task.height, 77);
    }

    #[test]
    fn test_persistence_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("chain-store.sqlite");

        {
            let store = SqliteChainStore::new(&db_path).unwrap();
            store.put_block(&make_block(1, 2)).unwrap();
            store.put_latest_task(1).unwrap();
        }

        let store = SqliteChainStore::new(&db_path).unwrap();
        let block = store.block_by_number(1).unwrap().unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert!(KvCache::get(&store, LATEST_TASK_KEY).unwrap().is_some());
    }
}
