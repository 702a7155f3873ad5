use anyhow::{Context, Result};
use catalog_common::{init_tracing_with_level, SystemConfig};
use catalog_indexing::IndexingPipeline;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "catalog-indexer")]
#[command(about = "Scan, classify and snapshot a document tree once", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the scanned root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Override where the snapshot is written
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, env = "CATALOG_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(&cli.log_level)?;

    info!("🚀 Starting catalog indexer");
    info!("📄 Using config: {}", cli.config.display());

    let mut config = SystemConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(root) = cli.root {
        config.indexing.source_root = root;
    }
    if let Some(output) = cli.output {
        config.indexing.snapshot_path = output;
    }
    config.validate()?;
    debug!("Loaded config: {:#?}", config);

    let pipeline = Arc::new(IndexingPipeline::new(&config));
    let report = tokio::task::spawn_blocking(move || pipeline.run())
        .await
        .context("Indexing task panicked")?
        .map_err(|e| {
            error!("❌ Indexing failed: {}", e);
            e
        })?;

    info!("✅ Indexing complete");
    println!("{report}");
    Ok(())
}
