//! qhn server entry point.
//!
//! Boots the story cache and its background daemons, then serves MCP on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use qhn_client::{HnClient, HnConfig};
use qhn_core::{AppConfig, PersistentCache, Story};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod lifecycle;
mod stories;
mod tools;

use lifecycle::{Daemons, run_until_stopped};
use stories::{PipelineRefresher, StoriesService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        num_stories = config.num_stories,
        fetch_width = config.fetch_width(),
        cache_path = %config.cache_path.display(),
        "Starting qhn server on stdio transport"
    );

    let provider = Arc::new(HnClient::new(HnConfig::from(&config))?);
    let pipeline = PipelineRefresher::new(provider, config.num_stories, config.fetch_width());

    let cache: Arc<PersistentCache<Vec<Story>>> =
        Arc::new(PersistentCache::open(config.cache_path.clone(), config.cache_ttl()).await);

    let daemons = Daemons::spawn(&cache, pipeline.clone(), config.refresh_lead(), config.persist_period());

    let service = Arc::new(StoriesService::new(pipeline, cache));
    run_until_stopped(daemons, serve(handler::QhnServer::new(service))).await
}

/// Serve MCP on stdio until the session ends or a shutdown signal arrives.
async fn serve(server: handler::QhnServer) -> Result<()> {
    tokio::select! {
        served = serve_stdio(server) => served,
        signal = shutdown_signal() => {
            tracing::info!(signal, "received shutdown signal");
            Ok(())
        }
    }
}

async fn serve_stdio(server: handler::QhnServer) -> Result<()> {
    serve_server(server, stdio()).await?.waiting().await?;
    tracing::info!("stdio session ended");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => tokio::select! {
                _ = ctrl_c() => "SIGINT",
                _ = term.recv() => "SIGTERM",
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        "ctrl-c"
    }
}

/// Waits for ctrl-c; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
