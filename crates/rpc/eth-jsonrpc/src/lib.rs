//! Ethereum-compatible JSON-RPC server for the chainquery read API.
//!
//! This crate provides the HTTP JSON-RPC surface over indexed chain history,
//! letting standard Ethereum wallets and tooling query blocks, transactions,
//! receipts, logs, and code without a full node.
//!
//! # Example
//!
//! ```rust,no_run
//! use chainquery_eth_jsonrpc::{start_server, RpcServerConfig};
//! # use chainquery_eth_jsonrpc::QueryApi;
//!
//! async fn run(provider: impl QueryApi) {
//!     let config = RpcServerConfig::default();
//!     let handle = start_server(config, provider).await.unwrap();
//!     handle.stopped().await;
//! }
//! ```

pub mod api;
pub mod error;
pub mod server;

// Re-export key types for convenience
pub use api::EthApiServer;
pub use error::{RpcError, RpcResult};
pub use server::{start_server, EthRpcServer, QueryApi, RpcServerConfig};
