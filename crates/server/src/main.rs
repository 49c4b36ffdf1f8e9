//! shellcache-mcp server entry point.
//!
//! Boots the MCP host on stdio transport with one worker version built from
//! the loaded configuration. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheWorker, FetchClient, FetchConfig, Transport};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod registration;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(cache = %config.cache_name, origin = %config.origin, db = %config.db_path.display(), "Starting shellcache-mcp on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let transport: Arc<dyn Transport> = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let registration = Arc::new(registration::Registration::new());
    let worker = Arc::new(CacheWorker::new(config, db, transport.clone(), registration.clone())?);

    let handler = handler::ShellCacheServer::new(worker.clone(), registration, transport);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
