use catalog_common::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared guard serializing writers of one snapshot file
pub type SnapshotLock = Arc<Mutex<()>>;

/// Accumulates classified entries for one build run and persists them wholesale
#[derive(Debug)]
pub struct ContentIndexer {
    output_path: PathBuf,
    preview_chars: usize,
    entries: Vec<IndexEntry>,
    lock: SnapshotLock,
}

impl ContentIndexer {
    pub fn new(output_path: impl Into<PathBuf>, preview_chars: usize) -> Self {
        Self::with_lock(output_path, preview_chars, SnapshotLock::default())
    }

    pub fn with_lock(output_path: impl Into<PathBuf>, preview_chars: usize, lock: SnapshotLock) -> Self {
        Self {
            output_path: output_path.into(),
            preview_chars,
            entries: Vec::new(),
            lock,
        }
    }

    /// Append one entry. Ids are 1-based insertion order within this run.
    pub fn add_document(&mut self, extraction: &ExtractionResult, classification: Classification) -> &IndexEntry {
        let full_text = extraction.text().into_owned();
        let record = &extraction.record;

        let entry = IndexEntry {
            id: self.entries.len() as u64 + 1,
            filename: record.filename.clone(),
            original_path: record.path.clone(),
            file_type: record.file_type.clone(),
            size: record.size,
            modified: record.modified,
            category: classification.category,
            subfolder: classification.subfolder,
            confidence: classification.confidence,
            reasoning_tags: classification.reasoning_tags,
            text_preview: preview(&full_text, self.preview_chars),
            full_text,
        };
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_snapshot(self) -> IndexSnapshot {
        IndexSnapshot::new(self.entries)
    }

    /// Overwrite the snapshot file with everything accumulated so far.
    ///
    /// The document is written to a hidden sibling and renamed into place
    /// while holding the snapshot lock, so readers see either the old or the
    /// new snapshot.
    pub fn save(&self) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        let tmp_path = temp_sibling(&self.output_path);

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CatalogError::persistence(&self.output_path, e))?;
        }

        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, &self.output_path)
        };

        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp_path);
            warn!(path = %self.output_path.display(), error = %e, "Failed to save index");
            return Err(CatalogError::persistence(&self.output_path, e));
        }

        info!(
            documents = self.entries.len(),
            path = %self.output_path.display(),
            "Successfully saved index"
        );
        Ok(self.output_path.clone())
    }
}

/// `.<name>.tmp` next to the destination
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

pub fn load_snapshot(path: &Path) -> Result<IndexSnapshot> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CatalogError::NotFound { path: path.to_path_buf() }
        } else {
            CatalogError::Io(e)
        }
    })?;
    Ok(IndexSnapshot::from_slice(&bytes)?)
}

const READ_ATTEMPTS: usize = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Async snapshot read that retries a few times when the document does not
/// parse, in case it was caught mid-rewrite.
pub async fn read_snapshot(path: &Path) -> Result<IndexSnapshot> {
    let mut attempt = 1;
    loop {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound { path: path.to_path_buf() });
            }
            Err(e) => return Err(CatalogError::Io(e)),
        };

        match IndexSnapshot::from_slice(&bytes) {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) if attempt < READ_ATTEMPTS => {
                debug!(attempt, error = %e, "Snapshot did not parse, retrying");
                attempt += 1;
                tokio::time::sleep(READ_RETRY_DELAY).await;
            }
            Err(e) => return Err(CatalogError::Serialization(e)),
        }
    }
}

/// Current snapshot, or an empty one when nothing has been written yet
pub async fn read_snapshot_or_empty(path: &Path) -> Result<IndexSnapshot> {
    match read_snapshot(path).await {
        Err(e) if e.is_not_found() => Ok(IndexSnapshot::default()),
        other => other,
    }
}
