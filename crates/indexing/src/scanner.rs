use catalog_common::{CatalogError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Enumerates candidate files under a root, pruning excluded directories
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    exclude_patterns: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, exclude_patterns: Vec<String>) -> Self {
        Self {
            root: root.into(),
            exclude_patterns,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree lazily. Every call starts a fresh traversal.
    ///
    /// The root is resolved first, so yielded paths are always absolute.
    pub fn scan(&self) -> Result<impl Iterator<Item = PathBuf> + '_> {
        let root = self.resolved_root()?;

        let files = WalkDir::new(root)
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry during scan");
                    None
                }
            })
            .filter(is_regular_file)
            .filter(|entry| !is_hidden(entry.file_name()))
            .map(DirEntry::into_path);

        Ok(files)
    }

    /// Absolute, symlink-free form of the root. `NotFound` when it is absent.
    pub fn resolved_root(&self) -> Result<PathBuf> {
        self.root.canonicalize().map_err(|_| CatalogError::NotFound {
            path: self.root.clone(),
        })
    }

    /// Exclusion is a substring match on the whole path, so a pattern prunes
    /// the matching directory and everything below it.
    pub fn excludes(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir() && self.excludes(entry.path())
    }
}

fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

pub fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}
