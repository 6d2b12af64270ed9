//! swcache server entry point.
//!
//! Boots the caching worker for the configured version and serves the harness
//! tools over MCP on stdio. Logging goes to stderr to avoid interfering with
//! the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::config::StoreKind;
use swcache_core::{AppConfig, CacheDb, MemoryStore, PartitionStore};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod harness;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing::info!(version = %config.version, scope = %config.scope, "Starting swcache server on stdio transport");

    let store: Arc<dyn PartitionStore> = match config.store {
        StoreKind::Sqlite => {
            let db = CacheDb::open(&config.db_path)
                .await
                .with_context(|| format!("failed to open cache database at {}", config.db_path.display()))?;
            Arc::new(db)
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };

    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let harness = Arc::new(harness::Harness::new(config, store, network)?);

    // A first-ever load with no connectivity still registers; seeds that fail are skipped.
    let status = harness.start().await?;
    tracing::info!(active = ?status.active.map(|w| w.version), "worker registered");

    let handler = handler::SwCacheServer::new(harness);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
