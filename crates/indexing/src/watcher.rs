//! Filesystem observers that drive the catalog.
//!
//! notify delivers events on its own OS thread. The callback only stamps the
//! event and queues it with `blocking_send`; everything else (debounce, pipeline
//! launch, snapshot delivery) happens in a single dispatch task on the tokio
//! runtime, which is the only place watcher state is touched.

use crate::indexer::read_snapshot;
use crate::pipeline::IndexingPipeline;
use crate::scanner::{is_hidden, Scanner};
use async_trait::async_trait;
use catalog_common::*;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Cooldown,
}

/// Leading-edge debounce: the first event fires, anything within `cooldown`
/// of the last firing is dropped.
#[derive(Debug, Clone)]
pub struct DebounceState {
    last_trigger: Option<Instant>,
    cooldown: Duration,
}

impl DebounceState {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_trigger: None,
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Record a trigger at `now` if the cooldown since the last one has elapsed
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.last_trigger {
            Some(last) if now.saturating_duration_since(last) <= self.cooldown => false,
            _ => {
                self.last_trigger = Some(now);
                true
            }
        }
    }

    /// Cooldown has no exit transition of its own; it lapses with time
    pub fn state(&self, now: Instant) -> WatcherState {
        match self.last_trigger {
            Some(last) if now.saturating_duration_since(last) <= self.cooldown => WatcherState::Cooldown,
            _ => WatcherState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
}

/// One filesystem change, stamped when the observer saw it
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
    pub observed_at: Instant,
}

fn translate(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(WatchEventKind::Modified),
        _ => None,
    }
}

/// OS-level observer feeding a bounded queue
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl FileWatcher {
    pub fn new(path: &Path, recursive: bool, events: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let Some(kind) = translate(&event.kind) else {
                    return;
                };
                let observed_at = Instant::now();
                for path in event.paths {
                    // runs on the notify thread, never inside the runtime
                    if events.blocking_send(WatchEvent { path, kind, observed_at }).is_err() {
                        debug!("Dispatch queue closed, dropping event");
                        return;
                    }
                }
            }
            Err(e) => error!("Watch error: {:?}", e),
        })
        .map_err(|e| CatalogError::Watch(e.to_string()))?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(path, mode)
            .map_err(|e| CatalogError::Watch(format!("cannot watch {}: {}", path.display(), e)))?;
        info!("Watching path: {:?}", path);

        Ok(Self {
            _watcher: watcher,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Single consumer of one watcher's queue. Applies the qualifying filter and
/// the debounce, then awaits `action` for each event that fires.
pub(crate) fn spawn_dispatch<Q, F, Fut>(
    name: &'static str,
    mut events: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
    mut debounce: DebounceState,
    triggers: Arc<AtomicUsize>,
    qualifies: Q,
    mut action: F,
) -> JoinHandle<()>
where
    Q: Fn(&WatchEvent) -> bool + Send + 'static,
    F: FnMut(WatchEvent) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if !qualifies(&event) {
                continue;
            }
            if !debounce.try_fire(event.observed_at) {
                debug!(watcher = name, path = %event.path.display(), "Suppressed during cooldown");
                continue;
            }

            triggers.fetch_add(1, Ordering::SeqCst);
            info!(watcher = name, path = %event.path.display(), kind = ?event.kind, "Change detected");
            action(event).await;
        }
        debug!(watcher = name, "Dispatch stopped");
    })
}

struct WatchHandle {
    name: &'static str,
    observer: FileWatcher,
    cancel: CancellationToken,
    dispatch: JoinHandle<()>,
    triggers: Arc<AtomicUsize>,
}

impl WatchHandle {
    async fn stop(self) {
        // dropping the observer drops the queue's only sender
        drop(self.observer);
        self.cancel.cancel();
        if let Err(e) = self.dispatch.await {
            warn!(watcher = self.name, error = %e, "Dispatch task ended abnormally");
        }
    }
}

/// Snapshot path with its directory resolved, creating the directory if needed.
/// Observers report resolved paths, so comparisons must use this form.
fn resolve_snapshot_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| CatalogError::Config(format!("snapshot path has no file name: {}", path.display())))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    Ok(parent.canonicalize()?.join(name))
}

/// A change under the source root that should trigger a rescan
fn is_source_change(event: &WatchEvent, snapshot: &Path, scanner: &Scanner) -> bool {
    let hidden = event.path.file_name().map(is_hidden).unwrap_or(true);
    !hidden && event.path != snapshot && !scanner.excludes(&event.path) && !event.path.is_dir()
}

/// Watches the source tree and launches a full pipeline run per debounced change
pub struct ChangeWatcher {
    handle: WatchHandle,
    runs: TaskTracker,
}

impl ChangeWatcher {
    /// Must be called from within a tokio runtime
    pub fn start(pipeline: Arc<IndexingPipeline>, config: &WatchConfig) -> Result<Self> {
        let root = pipeline.scanner().resolved_root()?;
        let snapshot = resolve_snapshot_path(pipeline.snapshot_path())?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let observer = FileWatcher::new(&root, config.recursive, tx)?;
        let cancel = CancellationToken::new();
        let triggers = Arc::new(AtomicUsize::new(0));
        let runs = TaskTracker::new();

        let qualifies = {
            let pipeline = Arc::clone(&pipeline);
            move |event: &WatchEvent| is_source_change(event, &snapshot, pipeline.scanner())
        };
        let action = {
            let runs = runs.clone();
            move |_event: WatchEvent| {
                let pipeline = Arc::clone(&pipeline);
                // independent unit of work; the dispatch loop does not wait on it
                runs.spawn_blocking(move || match pipeline.run() {
                    Ok(report) => info!(
                        indexed = report.indexed,
                        skipped = report.skipped,
                        "Rescan finished"
                    ),
                    Err(e) => error!(error = %e, "Rescan failed"),
                });
                std::future::ready(())
            }
        };

        let dispatch = spawn_dispatch(
            "change",
            rx,
            cancel.clone(),
            DebounceState::new(config.rescan_cooldown()),
            Arc::clone(&triggers),
            qualifies,
            action,
        );

        Ok(Self {
            handle: WatchHandle {
                name: "change",
                observer,
                cancel,
                dispatch,
                triggers,
            },
            runs,
        })
    }

    pub fn watched_path(&self) -> &Path {
        self.handle.observer.path()
    }

    /// Number of pipeline runs launched so far
    pub fn triggers(&self) -> usize {
        self.handle.triggers.load(Ordering::SeqCst)
    }

    /// Stop dispatching, then wait for in-flight runs to finish on their own
    pub async fn stop(self) {
        self.handle.stop().await;
        self.runs.close();
        self.runs.wait().await;
        info!("Change watcher stopped");
    }
}

/// Receiver of freshly loaded snapshots
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn snapshot_changed(&self, snapshot: IndexSnapshot);
}

/// Watches the snapshot file and hands each new version to a [`SnapshotSink`]
pub struct SnapshotWatcher {
    handle: WatchHandle,
}

impl SnapshotWatcher {
    /// Must be called from within a tokio runtime
    pub fn start(snapshot_path: &Path, sink: Arc<dyn SnapshotSink>, config: &WatchConfig) -> Result<Self> {
        let target = resolve_snapshot_path(snapshot_path)?;
        let directory = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // the snapshot is replaced by rename, so watch its directory rather than the inode
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let observer = FileWatcher::new(&directory, false, tx)?;
        let cancel = CancellationToken::new();
        let triggers = Arc::new(AtomicUsize::new(0));

        let qualifies = {
            let target = target.clone();
            move |event: &WatchEvent| event.path == target
        };
        let action = move |_event: WatchEvent| {
            let sink = Arc::clone(&sink);
            let target = target.clone();
            async move {
                match read_snapshot(&target).await {
                    Ok(snapshot) => {
                        debug!(entries = snapshot.len(), "Loaded snapshot");
                        sink.snapshot_changed(snapshot).await;
                    }
                    Err(e) => warn!(path = %target.display(), error = %e, "Failed to load snapshot, skipping"),
                }
            }
        };

        let dispatch = spawn_dispatch(
            "snapshot",
            rx,
            cancel.clone(),
            DebounceState::new(config.snapshot_cooldown()),
            Arc::clone(&triggers),
            qualifies,
            action,
        );

        Ok(Self {
            handle: WatchHandle {
                name: "snapshot",
                observer,
                cancel,
                dispatch,
                triggers,
            },
        })
    }

    pub fn watched_path(&self) -> &Path {
        self.handle.observer.path()
    }

    /// Number of snapshot loads attempted so far
    pub fn triggers(&self) -> usize {
        self.handle.triggers.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.handle.stop().await;
        info!("Snapshot watcher stopped");
    }
}
