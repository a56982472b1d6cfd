//! PDF validation and info extraction
//!
//! Runs when a file is opened in the editor, before any annotation exists.

use lopdf::{Document, Object};
use serde::Serialize;

use crate::error::ValidationError;
use crate::page::resolve;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub valid: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

fn check_header(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.len() < 8 {
        return Err(ValidationError::TooSmall);
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(ValidationError::MissingHeader);
    }
    Ok(())
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, ValidationError> {
    check_header(bytes)?;

    let version = extract_version(bytes);
    let document =
        Document::load_mem(bytes).map_err(|e| ValidationError::Parse(e.to_string()))?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(ValidationError::NoPages);
    }

    let (title, author) = extract_metadata(&document);

    Ok(PdfInfo {
        page_count,
        version,
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        valid: true,
        title,
        author,
    })
}

/// Version from the `%PDF-x.y` header, "1.4" if unreadable
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .filter(|_| bytes.starts_with(b"%PDF-"))
        .and_then(|version| std::str::from_utf8(version).ok())
        .map(|version| version.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn info_string(document: &Document, info: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    let value = resolve(document, info.get(key).ok()?)?;
    let bytes = match value {
        Object::String(bytes, _) => bytes,
        _ => return None,
    };
    let decoded = String::from_utf8_lossy(bytes).into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

/// Title and author from the trailer's Info dictionary
fn extract_metadata(document: &Document) -> (Option<String>, Option<String>) {
    let info = document
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_dict().ok());

    match info {
        Some(info) => (
            info_string(document, info, b"Title"),
            info_string(document, info, b"Author"),
        ),
        None => (None, None),
    }
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), ValidationError> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(ValidationError::Truncated);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::blank_pdf;
    use lopdf::{dictionary, StringFormat};

    fn letter_pages(count: usize) -> Vec<u8> {
        blank_pdf(&vec![(612.0, 792.0); count])
    }

    #[test]
    fn test_quick_validate_rejects_non_pdf() {
        assert_eq!(
            quick_validate(b"not a pdf file"),
            Err(ValidationError::MissingHeader)
        );
    }

    #[test]
    fn test_quick_validate_rejects_small_file() {
        assert_eq!(quick_validate(b"tiny"), Err(ValidationError::TooSmall));
    }

    #[test]
    fn test_quick_validate_rejects_truncated_file() {
        let pdf = letter_pages(1);
        let truncated = &pdf[..pdf.len() - 8];
        assert_eq!(quick_validate(truncated), Err(ValidationError::Truncated));
    }

    #[test]
    fn test_quick_validate_accepts_valid_pdf() {
        assert!(quick_validate(&letter_pages(1)).is_ok());
    }

    #[test]
    fn test_validate_pdf_returns_correct_page_count() {
        let info = validate_pdf(&letter_pages(5)).unwrap();
        assert_eq!(info.page_count, 5);
        assert!(info.valid);
    }

    #[test]
    fn test_validate_pdf_single_page() {
        let pdf = letter_pages(1);
        let info = validate_pdf(&pdf).unwrap();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.version, "1.7");
        assert_eq!(info.size_bytes, pdf.len());
        assert!(!info.encrypted);
        assert_eq!(info.title, None);
    }

    #[test]
    fn test_validate_pdf_reads_metadata() {
        let mut doc = Document::load_mem(&letter_pages(1)).unwrap();
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly".to_vec(), StringFormat::Literal),
            "Author" => Object::String(b"".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", info_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let info = validate_pdf(&bytes).unwrap();
        assert_eq!(info.title.as_deref(), Some("Quarterly"));
        assert_eq!(info.author, None);
    }

    #[test]
    fn test_validate_pdf_rejects_invalid_data() {
        assert!(matches!(
            validate_pdf(b"%PDF-1.7 but nothing else"),
            Err(ValidationError::Parse(_))
        ));
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version(b"%PDF-1.7\n"), "1.7");
        assert_eq!(extract_version(b"%PDF-2.0\n"), "2.0");
        assert_eq!(extract_version(b"%PDF-"), "1.4");
    }
}
