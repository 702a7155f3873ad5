pub mod scanner;
pub mod extractor;
pub mod classifier;
pub mod indexer;
pub mod pipeline;
pub mod watcher;

pub use scanner::Scanner;
pub use extractor::Extractor;
pub use classifier::{Classifier, CategoryRule, SubfolderRule};
pub use indexer::{load_snapshot, read_snapshot, read_snapshot_or_empty, ContentIndexer};
pub use pipeline::{IndexingPipeline, RunReport};
pub use watcher::{ChangeWatcher, DebounceState, SnapshotSink, SnapshotWatcher, WatcherState};
