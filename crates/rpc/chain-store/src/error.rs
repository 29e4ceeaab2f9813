//! Error types for store and cache operations.

use thiserror::Error;

/// Errors that can occur while reading or writing indexed chain data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite database error.
    #[error("sqlite error: {0}")]
    Sqlite(String),

    /// A stored hex-string field failed to decode.
    #[error("invalid hex in stored row: {0}")]
    InvalidHex(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the latest-height cache client.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend is unreachable or failed.
    #[error("cache backend error: {0}")]
    Backend(String),
}
