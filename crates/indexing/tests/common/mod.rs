#![allow(dead_code)]

use catalog_common::config::SystemConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Source tree plus a separate output directory, both cleaned up on drop
pub struct Fixture {
    pub temp: TempDir,
    pub root: PathBuf,
    pub snapshot: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("unsorted");
        fs::create_dir(&root).unwrap();
        let snapshot = temp.path().join("out").join("catalog_index.json");
        Self { temp, root, snapshot }
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Config pointing at this fixture, with OCR disabled so tests never shell out
    pub fn config(&self) -> SystemConfig {
        let mut config = SystemConfig::default();
        config.indexing.source_root = self.root.clone();
        config.indexing.snapshot_path = self.snapshot.clone();
        config.indexing.ocr_command = None;
        config
    }
}

/// A mixed tree resembling an unorganized downloads folder
pub fn create_test_structure(fixture: &Fixture) {
    fixture.write("resume_ashok.txt", "education experience skills project summary of work so far");
    fixture.write("invoice_2023.txt", "invoice total billing");
    fixture.write("notes.txt", "remember to water the plants");
    fixture.write("scripts/cleanup.py", "print('tidy')");
    fixture.write(".DS_Store", "metadata");
    fixture.write("Organized_Personal_Files/Career/Ashok/old_cv.txt", "already filed");
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}
