//! Storage and query core for the chainquery read API.
//!
//! This crate owns the stored-row types, the SQLite-backed [`ChainStore`],
//! the latest-height [`KvCache`] client, the topic matcher, and the
//! [`ChainQueryProvider`] that implements the RPC-facing `QueryApi` trait on
//! top of them.

pub mod cache;
pub mod error;
pub mod filter;
pub mod provider;
pub mod store;
pub mod types;

pub use cache::{IndexTask, KvCache, MemoryKvCache, LATEST_TASK_KEY};
pub use error::{CacheError, StoreError, StoreResult};
pub use filter::matches_topics;
pub use provider::ChainQueryProvider;
pub use store::{ChainStore, SqliteChainStore, MAX_LOG_ROWS};
pub use types::{StoredBlock, StoredCode, StoredLog, StoredReceipt, StoredTransaction};
