//! Latest-height cache client.
//!
//! The ingestion pipeline records its progress as a JSON task record under a
//! well-known key in a key-value cache. The query side only ever reads that
//! one key.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Key under which the ingestion pipeline stores its latest task record.
pub const LATEST_TASK_KEY: &str = "chainquery:task:latest";

/// Progress record written by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexTask {
    /// Latest fully indexed block height.
    pub height: u64,
}

/// Read-only key-value cache client.
pub trait KvCache: Send + Sync {
    /// Get the raw value for a key, if present.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
}

impl<T: KvCache + ?Sized> KvCache for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key)
    }
}

/// In-memory cache for tests and development.
///
/// `set_fail(true)` makes every read return a backend error, simulating a
/// cache outage.
#[derive(Default)]
pub struct MemoryKvCache {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    fail: AtomicBool,
    reads: AtomicU64,
}

impl MemoryKvCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value.
    pub fn put(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().insert(key.to_string(), value);
    }

    /// Store the latest task record under the well-known key.
    pub fn put_latest_task(&self, height: u64) {
        let bytes = serde_json::to_vec(&IndexTask { height })
            .expect("task record serialization cannot fail");
        self.put(LATEST_TASK_KEY, bytes);
    }

    /// Toggle simulated outages.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of reads served so far (failed ones included).
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl KvCache for MemoryKvCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("simulated cache outage".to_string()));
        }
        Ok(self.entries.lock().get(key).cloned())
    }
}
