//! Type definitions for the catalog API

use catalog_common::IndexSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message pushed to every subscriber over the update stream
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage<'a> {
    /// The full snapshot as of the last successful run
    #[serde(rename = "UPDATE")]
    Update(&'a IndexSnapshot),
}

/// Optional filters for `GET /documents`
#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    /// Category name, matched case-insensitively
    pub category: Option<String>,

    /// Case-insensitive substring over filename, tags and full text
    pub q: Option<String>,
}

/// Query parameters accepted wherever a credential may be supplied.
/// Browsers cannot set headers on a WebSocket handshake, so `token` is the
/// fallback for `Authorization: Bearer`.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialParams {
    pub token: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,

    /// Entries in the current snapshot
    pub documents: usize,

    /// Connected update-stream subscribers
    pub subscribers: usize,

    /// Timestamp of health check
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    pub code: Option<String>,

    /// Timestamp of error
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            timestamp: Utc::now(),
        }
    }
}
