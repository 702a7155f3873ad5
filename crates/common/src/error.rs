use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to persist snapshot to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Authentication rejected")]
    AuthenticationRejected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True for the "nothing there yet" case that readers treat as an empty catalog
    pub fn is_not_found(&self) -> bool {
        match self {
            CatalogError::NotFound { .. } => true,
            CatalogError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
