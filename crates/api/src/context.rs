use crate::broadcaster::Broadcaster;
use catalog_common::*;
use catalog_indexing::{ChangeWatcher, IndexingPipeline, SnapshotSink, SnapshotWatcher};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Owns both watchers for the lifetime of the process.
///
/// Built once at startup and torn down with [`WatchContext::shutdown`]; no
/// watcher state lives outside it.
pub struct WatchContext {
    snapshots: SnapshotWatcher,
    changes: ChangeWatcher,
    initial_run: Option<JoinHandle<()>>,
}

impl WatchContext {
    /// Start the snapshot watcher first so the output of any run, including
    /// the initial one, reaches subscribers.
    pub async fn start(
        config: &SystemConfig,
        pipeline: Arc<IndexingPipeline>,
        broadcaster: Arc<Broadcaster>,
    ) -> Result<Self> {
        let sink: Arc<dyn SnapshotSink> = broadcaster;
        let snapshots = SnapshotWatcher::start(pipeline.snapshot_path(), sink, &config.watch)?;
        let changes = match ChangeWatcher::start(Arc::clone(&pipeline), &config.watch) {
            Ok(changes) => changes,
            Err(e) => {
                snapshots.stop().await;
                return Err(e);
            }
        };

        let initial_run = if tokio::fs::try_exists(pipeline.snapshot_path()).await.unwrap_or(false) {
            None
        } else {
            info!(path = %pipeline.snapshot_path().display(), "No snapshot yet, running initial index");
            Some(tokio::task::spawn_blocking(move || match pipeline.run() {
                Ok(report) => info!(indexed = report.indexed, "Initial index complete"),
                Err(e) => error!(error = %e, "Initial index failed"),
            }))
        };

        info!(
            source = %changes.watched_path().display(),
            snapshot_dir = %snapshots.watched_path().display(),
            "Watchers started"
        );
        Ok(Self {
            snapshots,
            changes,
            initial_run,
        })
    }

    /// Stop both watchers and let in-flight runs finish
    pub async fn shutdown(self) {
        self.changes.stop().await;
        if let Some(initial_run) = self.initial_run {
            if let Err(e) = initial_run.await {
                error!(error = %e, "Initial index task ended abnormally");
            }
        }
        self.snapshots.stop().await;
        info!("Watch context shut down");
    }
}
