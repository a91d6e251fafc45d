//! offcache server entry point.
//!
//! Boots the offline cache manager, registers it, and serves the lifecycle
//! tools over the MCP stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offcache_client::{FetchClient, FetchConfig};
use offcache_core::{AppConfig, CacheDb, OfflineCacheManager};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        generation = %config.cache_name,
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "starting offcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let manager = Arc::new(OfflineCacheManager::new(db, network, config.manager_config()?));

    // Registration never blocks startup. On failure the previously active
    // generation keeps answering, or requests pass straight through.
    match manager.register().await {
        Ok(state) => tracing::info!(%state, "offline cache registered"),
        Err(err) => tracing::warn!(error = %err, "offline cache registration failed"),
    }

    let handler = handler::OffcacheServer::new(manager);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
