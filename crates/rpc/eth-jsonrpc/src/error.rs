//! JSON-RPC error types following Ethereum error code conventions.

use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// Standard Ethereum JSON-RPC error codes.
pub mod codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid request - JSON is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Ethereum-specific error codes (in server error range -32000 to -32099)

    /// Resource not found
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    /// Resource unavailable
    pub const RESOURCE_UNAVAILABLE: i32 = -32002;
}

/// RPC-specific errors.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// Transaction hash unknown to the index.
    #[error("transaction not found")]
    TransactionNotFound,

    /// Block hash could not be resolved to a height.
    #[error("header for hash not found")]
    HeaderNotFound,
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        let (code, message) = match &err {
            RpcError::InvalidParams(msg) => (codes::INVALID_PARAMS, msg.clone()),
            RpcError::InternalError(msg) => (codes::INTERNAL_ERROR, msg.clone()),
            RpcError::TransactionNotFound => {
                (codes::RESOURCE_NOT_FOUND, "transaction not found".to_string())
            }
            RpcError::HeaderNotFound => (
                codes::RESOURCE_NOT_FOUND,
                "header for hash not found".to_string(),
            ),
        };

        ErrorObjectOwned::owned(code, message, None::<()>)
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
