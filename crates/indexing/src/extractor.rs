//! Per-file text extraction.
//!
//! Extraction never fails past this boundary for content problems: unreadable
//! bytes, broken PDFs, missing OCR tooling and unknown types all collapse into
//! an [`ExtractedText::Placeholder`]. The only `Err` is a file that cannot be
//! stat-ed at all, which the pipeline logs and skips.

use catalog_common::*;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Extensions read verbatim as (lossy) UTF-8
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "log", "py", "js", "ts", "html", "css", "json", "sql", "xml", "yaml",
    "yml", "toml",
];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff"];

#[derive(Debug, Clone)]
pub struct Extractor {
    pdf_max_pages: usize,
    ocr_command: Option<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&IndexingConfig::default())
    }
}

impl Extractor {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            pdf_max_pages: config.pdf_max_pages,
            ocr_command: config.ocr_command.clone(),
        }
    }

    pub fn with_ocr_command(mut self, command: Option<String>) -> Self {
        self.ocr_command = command;
        self
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let record = file_record(path)?;
        debug!(path = %path.display(), file_type = %record.file_type, "Extracting");

        let text = match record.file_type.as_str() {
            ext if TEXT_EXTENSIONS.contains(&ext) => read_lossy(path),
            "pdf" => self.read_pdf(path),
            ext if IMAGE_EXTENSIONS.contains(&ext) => self.run_ocr(path),
            other => ExtractedText::Placeholder(Sentinel::Unsupported(other.to_string())),
        };

        Ok(ExtractionResult { text, record })
    }

    #[cfg(feature = "pdf")]
    fn read_pdf(&self, path: &Path) -> ExtractedText {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return ExtractedText::Placeholder(Sentinel::ReadFailed(e.to_string())),
        };

        // pdf-extract panics on some malformed documents
        let max_pages = self.pdf_max_pages;
        let pages = std::panic::catch_unwind(|| leading_pdf_pages(&bytes, max_pages));
        match pages {
            Ok(Ok(text)) => ExtractedText::Content(text),
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "PDF decoding failed");
                ExtractedText::Placeholder(Sentinel::PdfUnreadable)
            }
            Err(_) => {
                warn!(path = %path.display(), "PDF decoder panicked");
                ExtractedText::Placeholder(Sentinel::PdfUnreadable)
            }
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn read_pdf(&self, _path: &Path) -> ExtractedText {
        ExtractedText::Placeholder(Sentinel::CapabilityMissing(Capability::Pdf))
    }

    /// Shells out to the configured OCR engine (`<cmd> <image> stdout`)
    fn run_ocr(&self, path: &Path) -> ExtractedText {
        let Some(command) = self.ocr_command.as_deref() else {
            return ExtractedText::Placeholder(Sentinel::CapabilityMissing(Capability::Ocr));
        };

        match Command::new(command).arg(path).arg("stdout").output() {
            Ok(output) if output.status.success() => {
                ExtractedText::Content(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let cause = if stderr.is_empty() {
                    format!("{} exited with {}", command, output.status)
                } else {
                    stderr
                };
                ExtractedText::Placeholder(Sentinel::OcrFailed(cause))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ExtractedText::Placeholder(Sentinel::CapabilityMissing(Capability::Ocr))
            }
            Err(e) => ExtractedText::Placeholder(Sentinel::OcrFailed(e.to_string())),
        }
    }
}

/// Decode at most `max_pages` pages; later pages are never interpreted
#[cfg(feature = "pdf")]
fn leading_pdf_pages(bytes: &[u8], max_pages: usize) -> std::result::Result<String, pdf_extract::OutputError> {
    use pdf_extract::{output_doc_page, Document, PlainTextOutput};

    let mut doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        doc.decrypt("")?;
    }

    let mut text = String::new();
    for page_num in doc.get_pages().into_keys().take(max_pages) {
        {
            let mut output = PlainTextOutput::new(&mut text);
            output_doc_page(&doc, &mut output, page_num)?;
        }
        text.push('\n');
    }
    Ok(text)
}

fn file_record(path: &Path) -> Result<FileRecord> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        CatalogError::Extraction(format!("cannot stat {}: {}", path.display(), e))
    })?;

    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

    Ok(FileRecord {
        path: path.to_path_buf(),
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        modified,
        file_type: path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    })
}

/// Read bytes as UTF-8, dropping malformed sequences instead of failing
fn read_lossy(path: &Path) -> ExtractedText {
    match std::fs::read(path) {
        Ok(bytes) => ExtractedText::Content(decode_dropping_invalid(&bytes)),
        Err(e) => ExtractedText::Placeholder(Sentinel::ReadFailed(e.to_string())),
    }
}

pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_decode_drops_malformed_bytes() {
        let bytes = b"inv\xffoice \xc3\x28total";
        assert_eq!(decode_dropping_invalid(bytes), "invoice (total");
    }

    #[test]
    fn test_metadata_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Report.TXT");
        fs::write(&path, "hello").unwrap();

        let result = Extractor::default().extract(&path).unwrap();
        assert_eq!(result.record.filename, "Report.TXT");
        assert_eq!(result.record.file_type, "txt");
        assert_eq!(result.record.size, 5);
        assert_eq!(result.text(), "hello");
    }

    #[test]
    fn test_unsupported_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("archive.zip");
        fs::write(&path, [0u8, 1, 2]).unwrap();

        let result = Extractor::default().extract(&path).unwrap();
        assert_eq!(
            result.text,
            ExtractedText::Placeholder(Sentinel::Unsupported("zip".to_string()))
        );
    }

    #[test]
    fn test_ocr_capability_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.png");
        fs::write(&path, [0x89u8, b'P', b'N', b'G']).unwrap();

        let disabled = Extractor::default().with_ocr_command(None);
        assert_eq!(
            disabled.extract(&path).unwrap().text,
            ExtractedText::Placeholder(Sentinel::CapabilityMissing(Capability::Ocr))
        );

        let absent = Extractor::default()
            .with_ocr_command(Some("definitely-not-an-ocr-binary-7f3a".to_string()));
        assert_eq!(
            absent.extract(&path).unwrap().text,
            ExtractedText::Placeholder(Sentinel::CapabilityMissing(Capability::Ocr))
        );
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_broken_pdf_yields_sentinel() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, b"Not a real PDF file").unwrap();

        let result = Extractor::default().extract(&path).unwrap();
        assert_eq!(result.text, ExtractedText::Placeholder(Sentinel::PdfUnreadable));
    }

    /// Minimal PDF with one line of Courier text per page
    #[cfg(feature = "pdf")]
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        use pdf_extract::content::{Content, Operation};
        use pdf_extract::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24i64.into()]),
                    Operation::new("Td", vec![100i64.into(), 600i64.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_stops_at_page_cap() {
        let bytes = pdf_with_pages(&["alpha", "bravo", "charlie"]);

        let text = leading_pdf_pages(&bytes, 2).unwrap();
        assert!(text.contains("alpha"));
        assert!(text.contains("bravo"));
        assert!(!text.contains("charlie"));

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.pdf");
        fs::write(&path, &bytes).unwrap();
        let mut config = IndexingConfig::default();
        config.pdf_max_pages = 1;
        let text = Extractor::new(&config).extract(&path).unwrap().text().to_string();
        assert!(text.contains("alpha"));
        assert!(!text.contains("bravo"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = Extractor::default().extract(&temp.path().join("vanished.txt"));
        assert!(matches!(result, Err(CatalogError::Extraction(_))));
    }
}
