#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use catalog_api::{Broadcaster, CatalogServer, StaticTokenAuthenticator};
use catalog_common::{Category, IndexEntry, IndexSnapshot, SystemConfig};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const TOKEN: &str = "test-token";

pub struct TestApp {
    pub temp: TempDir,
    pub config: SystemConfig,
    pub broadcaster: Arc<Broadcaster>,
}

impl TestApp {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let mut config = SystemConfig::default();
        config.indexing.source_root = temp.path().join("unsorted");
        config.indexing.snapshot_path = temp.path().join("catalog_index.json");
        config.indexing.ocr_command = None;
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.auth.tokens = HashMap::from([(TOKEN.to_string(), "tester".to_string())]);
        std::fs::create_dir(&config.indexing.source_root).unwrap();

        Self {
            temp,
            config,
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }

    pub fn server(&self) -> CatalogServer {
        CatalogServer::new(
            &self.config,
            Arc::clone(&self.broadcaster),
            Arc::new(StaticTokenAuthenticator::from_config(&self.config.auth)),
        )
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.config.indexing.snapshot_path
    }

    pub fn write_snapshot(&self, entries: Vec<IndexEntry>) {
        let json = serde_json::to_vec_pretty(&IndexSnapshot::new(entries)).unwrap();
        std::fs::write(self.snapshot_path(), json).unwrap();
    }
}

pub fn entry(id: u64, filename: &str, category: Category, text: &str) -> IndexEntry {
    IndexEntry {
        id,
        filename: filename.to_string(),
        original_path: PathBuf::from("/data/unsorted").join(filename),
        file_type: filename.rsplit_once('.').map(|(_, e)| e.to_string()).unwrap_or_default(),
        size: text.len() as u64,
        modified: Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap(),
        category,
        subfolder: "General".to_string(),
        confidence: 90,
        reasoning_tags: vec!["Content match".to_string(), "Name detected: General".to_string()],
        text_preview: text.chars().take(200).collect(),
        full_text: text.to_string(),
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
