use catalog_common::types::*;
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::str::FromStr;

fn sample_entry(id: u64) -> IndexEntry {
    IndexEntry {
        id,
        filename: "invoice_2023.pdf".to_string(),
        original_path: PathBuf::from("/data/invoice_2023.pdf"),
        file_type: "pdf".to_string(),
        size: 2048,
        modified: Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap(),
        category: Category::Financial,
        subfolder: "Receipts_Invoices".to_string(),
        confidence: 88,
        reasoning_tags: vec!["Content match".to_string(), "Name detected: General".to_string()],
        text_preview: "invoice total".to_string(),
        full_text: "invoice total billing".to_string(),
    }
}

#[test]
fn test_snapshot_wire_keys() {
    let snapshot = IndexSnapshot::new(vec![sample_entry(1)]);
    let value = serde_json::to_value(&snapshot).unwrap();

    let entry = value.as_array().unwrap()[0].as_object().unwrap();
    for key in [
        "id",
        "filename",
        "original_path",
        "file_type",
        "file_size",
        "file_date",
        "category",
        "subfolder",
        "confidence",
        "tags",
        "extracted_text_preview",
        "full_text",
    ] {
        assert!(entry.contains_key(key), "missing key {key}");
    }
    assert_eq!(entry["category"], "Financial");
    assert_eq!(entry["file_date"], "2023-04-01T12:00:00Z");
}

#[test]
fn test_snapshot_parse() {
    let snapshot = IndexSnapshot::new(vec![sample_entry(1), sample_entry(2)]);
    let bytes = serde_json::to_vec_pretty(&snapshot).unwrap();

    let parsed = IndexSnapshot::from_slice(&bytes).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.entries()[1].id, 2);
    assert_eq!(parsed, snapshot);
}

#[test]
fn test_sentinel_text() {
    assert_eq!(Sentinel::PdfUnreadable.to_string(), "[PDF Error]");
    assert_eq!(
        Sentinel::Unsupported("docx".to_string()).to_string(),
        "[Unsupported file type: docx]"
    );
    assert_eq!(
        Sentinel::ReadFailed("Permission denied".to_string()).to_string(),
        "[Extraction Error: Permission denied]"
    );
    assert!(Sentinel::CapabilityMissing(Capability::Ocr)
        .to_string()
        .contains("OCR Placeholder"));

    let text = ExtractedText::Placeholder(Sentinel::OcrFailed("bad image".to_string()));
    assert!(text.is_placeholder());
    assert_eq!(text.as_text(), "[OCR Error: bad image]");
}

#[test]
fn test_category_names() {
    assert_eq!(Category::Career.to_string(), "Career");
    assert_eq!(Category::from_str("Miscellaneous").unwrap(), Category::Miscellaneous);
    assert!(Category::from_str("Unknown").is_err());

    assert_eq!(Category::parse_loose(" financial "), Some(Category::Financial));
    assert_eq!(Category::parse_loose("PROJECTS"), Some(Category::Projects));
    assert_eq!(Category::parse_loose("Medical"), None);
}

#[test]
fn test_disposition_thresholds() {
    assert_eq!(Disposition::from_confidence(95, 85, 60), Disposition::AutoFile);
    assert_eq!(Disposition::from_confidence(85, 85, 60), Disposition::AutoFile);
    assert_eq!(Disposition::from_confidence(70, 85, 60), Disposition::NeedsReview);
    assert_eq!(Disposition::from_confidence(40, 85, 60), Disposition::Unsorted);
}

#[test]
fn test_preview_counts_chars() {
    let text = "é".repeat(300);
    let short = preview(&text, 200);

    assert_eq!(short.chars().count(), 200);
    assert_eq!(preview("abc", 200), "abc");
}

#[test]
fn test_classification_reasoning() {
    let classification = Classification {
        category: Category::Career,
        subfolder: "Ashok".to_string(),
        confidence: 90,
        reasoning_tags: vec!["Content match".to_string(), "Name detected: Ashok".to_string()],
    };

    assert_eq!(classification.reasoning(), "Content match. Name detected: Ashok");
}
