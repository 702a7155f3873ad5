//! Catalog server entry point
//!
//! Loads configuration, starts the watchers and serves the HTTP/WebSocket API
//! until Ctrl+C.

use anyhow::{Context, Result};
use catalog_api::{Broadcaster, CatalogServer, StaticTokenAuthenticator, WatchContext};
use catalog_common::{init_tracing_with_level, SystemConfig};
use catalog_indexing::IndexingPipeline;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(version = "0.1.0")]
#[command(about = "Live document catalog over HTTP and WebSocket")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CATALOG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(long)]
    port: Option<u16>,

    /// Serve the existing snapshot without watching for changes
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(&cli.log_level)?;

    info!("Catalog server v0.1.0 starting");

    let mut config = SystemConfig::load_or_default(&cli.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_watch {
        config.watch.enabled = false;
    }
    config.validate()?;

    let authenticator = StaticTokenAuthenticator::from_config(&config.auth);
    if authenticator.is_empty() {
        warn!("No credentials configured under [auth]; every authenticated request will be rejected");
    }

    let broadcaster = Arc::new(Broadcaster::new());
    let pipeline = Arc::new(IndexingPipeline::new(&config));

    let watchers = if config.watch.enabled {
        let context = WatchContext::start(&config, pipeline, Arc::clone(&broadcaster))
            .await
            .context("Failed to start watchers")?;
        Some(context)
    } else {
        info!("Watching disabled, serving the existing snapshot only");
        None
    };

    let server = CatalogServer::new(&config, broadcaster, Arc::new(authenticator));
    let result = server.run(shutdown_signal()).await;

    if let Some(watchers) = watchers {
        watchers.shutdown().await;
    }
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
