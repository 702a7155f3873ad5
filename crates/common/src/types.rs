use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Metadata for one discovered file. Identity is the absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Lowercased extension without the leading dot, empty when there is none
    pub file_type: String,
}

/// Optional capabilities the extractor may lack at runtime
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Pdf,
    Ocr,
}

/// Placeholder substituted for real content when extraction is impossible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    /// The page-oriented decoder rejected the document
    PdfUnreadable,
    CapabilityMissing(Capability),
    OcrFailed(String),
    Unsupported(String),
    ReadFailed(String),
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::PdfUnreadable => write!(f, "[PDF Error]"),
            Sentinel::CapabilityMissing(Capability::Pdf) => {
                write!(f, "[PDF Extraction Placeholder - PDF support missing]")
            }
            Sentinel::CapabilityMissing(Capability::Ocr) => {
                write!(f, "[Image OCR Placeholder - Tesseract missing]")
            }
            Sentinel::OcrFailed(cause) => write!(f, "[OCR Error: {}]", cause),
            Sentinel::Unsupported(file_type) => write!(f, "[Unsupported file type: {}]", file_type),
            Sentinel::ReadFailed(cause) => write!(f, "[Extraction Error: {}]", cause),
        }
    }
}

/// Text produced for one file: genuine content or a recovered placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Content(String),
    Placeholder(Sentinel),
}

impl ExtractedText {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ExtractedText::Content(text) => Cow::Borrowed(text.as_str()),
            ExtractedText::Placeholder(sentinel) => Cow::Owned(sentinel.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ExtractedText::Placeholder(_))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub text: ExtractedText,
    pub record: FileRecord,
}

impl ExtractionResult {
    pub fn text(&self) -> Cow<'_, str> {
        self.text.as_text()
    }
}

/// Top-level service category a document is filed under
#[derive(
    Display, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Career,
    Academic,
    Identity,
    Financial,
    Projects,
    Miscellaneous,
}

impl Category {
    /// Case-insensitive lookup by display name
    pub fn parse_loose(name: &str) -> Option<Self> {
        Category::iter().find(|category| category.to_string().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub subfolder: String,
    /// Rule-assigned certainty, 0-100
    pub confidence: u8,
    pub reasoning_tags: Vec<String>,
}

impl Classification {
    pub fn reasoning(&self) -> String {
        self.reasoning_tags.join(". ")
    }
}

/// What the operator should do with a classified file
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    AutoFile,
    NeedsReview,
    Unsorted,
}

impl Disposition {
    pub fn from_confidence(confidence: u8, auto_file_threshold: u8, review_threshold: u8) -> Self {
        if confidence >= auto_file_threshold {
            Disposition::AutoFile
        } else if confidence >= review_threshold {
            Disposition::NeedsReview
        } else {
            Disposition::Unsorted
        }
    }
}

/// One catalog row. `id` is assigned per build run and is not stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: u64,
    pub filename: String,
    pub original_path: PathBuf,
    pub file_type: String,
    #[serde(rename = "file_size")]
    pub size: u64,
    #[serde(rename = "file_date")]
    pub modified: DateTime<Utc>,
    pub category: Category,
    pub subfolder: String,
    pub confidence: u8,
    #[serde(rename = "tags")]
    pub reasoning_tags: Vec<String>,
    #[serde(rename = "extracted_text_preview")]
    pub text_preview: String,
    pub full_text: String,
}

/// The complete persisted catalog as of the last successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSnapshot(pub Vec<IndexEntry>);

impl IndexSnapshot {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// First `max_chars` characters of `text`, respecting char boundaries
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
