//! chainqueryd
//!
//! Read-only Ethereum-compatible JSON-RPC daemon over a database of indexed
//! chain data. A separate ingestion pipeline populates the database; this
//! process only serves queries.
//!
//! ## Usage
//!
//! ```bash
//! # Serve an existing index
//! chainqueryd --db ./data/chainquery.sqlite
//!
//! # Custom bind address
//! chainqueryd --db ./data/chainquery.sqlite --rpc-addr 0.0.0.0:8545
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chainquery_chain_store::{ChainQueryProvider, SqliteChainStore};
use chainquery_eth_jsonrpc::{start_server, RpcServerConfig};

#[derive(Parser)]
#[command(name = "chainqueryd")]
#[command(about = "Ethereum-compatible query daemon for indexed chain data")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database written by the ingestion pipeline
    #[arg(long, default_value = "chainquery.sqlite")]
    db: PathBuf,

    /// Address to bind the JSON-RPC server to
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Log filter, e.g. "info" or "chainquery_chain_store=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    tracing::info!("opening chain store at {}", cli.db.display());
    let store = Arc::new(
        SqliteChainStore::new(&cli.db)
            .with_context(|| format!("failed to open chain store at {}", cli.db.display()))?,
    );

    // The latest-height record lives in the same database, so the store
    // doubles as the cache client.
    let provider = ChainQueryProvider::new(Arc::clone(&store), store);

    let config = RpcServerConfig {
        http_addr: cli.rpc_addr,
    };
    let handle = start_server(config, provider)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start RPC server: {e}"))?;

    tracing::info!("serving queries; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    handle.stop()?;
    handle.stopped().await;
    Ok(())
}
