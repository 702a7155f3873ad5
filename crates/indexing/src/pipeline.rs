use crate::classifier::Classifier;
use crate::extractor::Extractor;
use crate::indexer::{ContentIndexer, SnapshotLock};
use crate::scanner::Scanner;
use catalog_common::*;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Outcome of one full Scanner -> Extractor -> Classifier -> Indexer run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub files_found: usize,
    pub indexed: usize,
    /// Files that could not be stat-ed and were left out of the snapshot
    pub skipped: usize,
    /// Entries whose text is a sentinel rather than real content
    pub placeholders: usize,
    pub by_disposition: HashMap<Disposition, usize>,
    pub snapshot_path: PathBuf,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn disposition_count(&self, disposition: Disposition) -> usize {
        self.by_disposition.get(&disposition).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexed {} of {} files in {:.2?}", self.indexed, self.files_found, self.elapsed)?;
        writeln!(f, "  skipped:      {}", self.skipped)?;
        writeln!(f, "  placeholders: {}", self.placeholders)?;
        writeln!(f, "  auto-file:    {}", self.disposition_count(Disposition::AutoFile))?;
        writeln!(f, "  needs review: {}", self.disposition_count(Disposition::NeedsReview))?;
        writeln!(f, "  unsorted:     {}", self.disposition_count(Disposition::Unsorted))?;
        write!(f, "  snapshot:     {}", self.snapshot_path.display())
    }
}

/// Rebuilds the whole snapshot from the source tree.
///
/// A pipeline is cheap to share behind an `Arc`; overlapping calls to
/// [`IndexingPipeline::run`] queue on an internal run lock so only one build
/// is in flight per pipeline.
#[derive(Debug)]
pub struct IndexingPipeline {
    scanner: Scanner,
    extractor: Extractor,
    classifier: Classifier,
    snapshot_path: PathBuf,
    preview_chars: usize,
    auto_file_threshold: u8,
    review_threshold: u8,
    snapshot_lock: SnapshotLock,
    run_lock: Mutex<()>,
}

impl IndexingPipeline {
    pub fn new(config: &SystemConfig) -> Self {
        let indexing = &config.indexing;
        Self {
            scanner: Scanner::new(&indexing.source_root, indexing.exclude_patterns.clone()),
            extractor: Extractor::new(indexing),
            classifier: Classifier::new(&config.classifier),
            snapshot_path: indexing.snapshot_path.clone(),
            preview_chars: indexing.preview_chars,
            auto_file_threshold: config.classifier.auto_file_threshold,
            review_threshold: config.classifier.review_threshold,
            snapshot_lock: SnapshotLock::default(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn source_root(&self) -> &Path {
        self.scanner.root()
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Run one full build and overwrite the snapshot.
    ///
    /// Blocking; async callers go through `spawn_blocking`. A missing root or a
    /// failed save fails the run. Per-file problems are logged and skipped.
    #[instrument(skip(self), fields(root = %self.scanner.root().display()))]
    pub fn run(&self) -> Result<RunReport> {
        let _run = self.run_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let started = Instant::now();

        let mut indexer =
            ContentIndexer::with_lock(&self.snapshot_path, self.preview_chars, self.snapshot_lock.clone());
        let mut files_found = 0;
        let mut skipped = 0;
        let mut placeholders = 0;
        let mut by_disposition: HashMap<Disposition, usize> = HashMap::new();

        for path in self.scanner.scan()? {
            if self.is_snapshot_file(&path) {
                continue;
            }
            files_found += 1;

            let extraction = match self.extractor.extract(&path) {
                Ok(extraction) => extraction,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping file");
                    skipped += 1;
                    continue;
                }
            };
            if extraction.text.is_placeholder() {
                placeholders += 1;
            }

            let classification = self.classifier.classify(&extraction.text(), &extraction.record);
            let disposition = Disposition::from_confidence(
                classification.confidence,
                self.auto_file_threshold,
                self.review_threshold,
            );
            *by_disposition.entry(disposition).or_default() += 1;

            let entry = indexer.add_document(&extraction, classification);
            info!(
                id = entry.id,
                filename = %entry.filename,
                category = %entry.category,
                subfolder = %entry.subfolder,
                confidence = entry.confidence,
                %disposition,
                "Classified"
            );
        }

        let snapshot_path = indexer.save()?;
        let report = RunReport {
            files_found,
            indexed: indexer.len(),
            skipped,
            placeholders,
            by_disposition,
            snapshot_path,
            elapsed: started.elapsed(),
        };
        info!(
            files_found = report.files_found,
            indexed = report.indexed,
            skipped = report.skipped,
            placeholders = report.placeholders,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pipeline run complete"
        );
        Ok(report)
    }

    /// The snapshot may live inside the scanned tree; it must never index itself
    fn is_snapshot_file(&self, path: &Path) -> bool {
        if path.file_name() != self.snapshot_path.file_name() {
            return false;
        }
        match (path.canonicalize(), self.snapshot_path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => path == self.snapshot_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &Path, snapshot: &Path) -> SystemConfig {
        let mut config = SystemConfig::default();
        config.indexing.source_root = root.to_path_buf();
        config.indexing.snapshot_path = snapshot.to_path_buf();
        config.indexing.ocr_command = None;
        config
    }

    #[test]
    fn test_snapshot_inside_root_is_not_indexed() {
        let temp = TempDir::new().unwrap();
        let snapshot = temp.path().join("catalog_index.json");
        fs::write(temp.path().join("notes.txt"), "plain prose").unwrap();

        let pipeline = IndexingPipeline::new(&config_for(temp.path(), &snapshot));
        pipeline.run().unwrap();
        let second = pipeline.run().unwrap();

        assert_eq!(second.files_found, 1);
        assert_eq!(second.indexed, 1);
    }

    #[test]
    fn test_dispositions_are_tallied() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("src");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("passport.txt"), "passport number").unwrap();
        fs::write(root.join("notes.txt"), "groceries and errands").unwrap();

        let pipeline = IndexingPipeline::new(&config_for(&root, &temp.path().join("out.json")));
        let report = pipeline.run().unwrap();

        assert_eq!(report.disposition_count(Disposition::AutoFile), 1);
        assert_eq!(report.disposition_count(Disposition::Unsorted), 1);
        assert_eq!(report.disposition_count(Disposition::NeedsReview), 0);
    }

    #[test]
    fn test_missing_root_fails_run() {
        let temp = TempDir::new().unwrap();
        let pipeline = IndexingPipeline::new(&config_for(
            &temp.path().join("absent"),
            &temp.path().join("out.json"),
        ));

        assert!(matches!(pipeline.run(), Err(CatalogError::NotFound { .. })));
        assert!(!temp.path().join("out.json").exists());
    }
}
