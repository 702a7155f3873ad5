use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub indexing: IndexingConfig,
    pub watch: WatchConfig,
    pub classifier: ClassifierConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Root of the unorganized tree that is scanned and watched
    pub source_root: PathBuf,
    /// Where the catalog snapshot is written
    pub snapshot_path: PathBuf,
    /// Directories whose path contains any of these substrings are pruned
    pub exclude_patterns: Vec<String>,
    pub preview_chars: usize,
    pub pdf_max_pages: usize,
    /// External OCR executable; `None` disables image text extraction
    pub ocr_command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub recursive: bool,
    pub rescan_cooldown_secs: u64,
    pub snapshot_cooldown_secs: u64,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameToken {
    pub token: String,
    pub label: String,
}

impl NameToken {
    pub fn new(token: &str, label: &str) -> Self {
        Self {
            token: token.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub auto_file_threshold: u8,
    pub review_threshold: u8,
    /// Person names looked for in the filename (checked first)
    pub filename_names: Vec<NameToken>,
    /// Person names looked for near the top of the text
    pub text_names: Vec<NameToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// credential -> principal
    pub tokens: HashMap<String, String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            snapshot_path: PathBuf::from("catalog_index.json"),
            exclude_patterns: vec![
                "Organized_Personal_Files".to_string(),
                "doc-catalog".to_string(),
                ".gemini".to_string(),
                "com.replay.Replay".to_string(),
            ],
            preview_chars: 200,
            pdf_max_pages: 6,
            ocr_command: Some("tesseract".to_string()),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recursive: true,
            rescan_cooldown_secs: 10,
            snapshot_cooldown_secs: 1,
            queue_capacity: 128,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            auto_file_threshold: 85,
            review_threshold: 60,
            filename_names: vec![
                NameToken::new("ashok", "Ashok"),
                NameToken::new("ash ", "Ashok"),
                NameToken::new("bala", "Bala"),
                NameToken::new("gowtham", "Gowthamsai"),
            ],
            text_names: vec![
                NameToken::new("ashok", "Ashok"),
                NameToken::new("bala chandra", "Bala"),
            ],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl WatchConfig {
    pub fn rescan_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.rescan_cooldown_secs)
    }

    pub fn snapshot_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.snapshot_cooldown_secs)
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SystemConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: SystemConfig = toml::from_str(&content)
            .map_err(|e| CatalogError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.indexing.snapshot_path.as_os_str().is_empty() {
            return Err(CatalogError::Config("indexing.snapshot_path must not be empty".into()));
        }
        if self.indexing.preview_chars == 0 {
            return Err(CatalogError::Config("indexing.preview_chars must be positive".into()));
        }
        if self.watch.rescan_cooldown_secs == 0 || self.watch.snapshot_cooldown_secs == 0 {
            return Err(CatalogError::Config("watch cooldowns must be at least one second".into()));
        }
        if self.watch.queue_capacity == 0 {
            return Err(CatalogError::Config("watch.queue_capacity must be positive".into()));
        }
        if self.classifier.review_threshold > self.classifier.auto_file_threshold {
            return Err(CatalogError::Config(format!(
                "classifier.review_threshold ({}) exceeds auto_file_threshold ({})",
                self.classifier.review_threshold, self.classifier.auto_file_threshold
            )));
        }
        Ok(())
    }
}
