//! PDF text extraction.
//!
//! Uses lopdf for document structure (page count, Info dictionary) and
//! pdf-extract for the per-page text layer.

use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Separator placed between the text of consecutive pages
const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid PDF file: {0}")]
    Malformed(String),
    #[error("failed to read PDF file: {0}")]
    Io(#[from] std::io::Error),
}

/// Half-open page interval `[start, end)`, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Clamp the range to a document of `pages` pages.
    fn clamp(self, pages: usize) -> std::ops::Range<usize> {
        let end = self.end.min(pages);
        let start = self.start.min(end);
        start..end
    }
}

/// Text and metadata extracted from one PDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfExtractResult {
    /// Page texts joined by a blank line
    pub text: String,
    /// The file the text was read from
    pub path: PathBuf,
    /// Page count of the whole document, independent of any page range
    pub pages: usize,
    /// Info dictionary entries, keys without the leading `/`
    pub metadata: BTreeMap<String, String>,
}

impl PdfExtractResult {
    /// Look up a metadata entry, ignoring blank values
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Reads PDF files into [`PdfExtractResult`]s.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    page_range: Option<PageRange>,
}

impl PdfExtractor {
    pub fn new(page_range: Option<PageRange>) -> Self {
        Self { page_range }
    }

    /// Extract text, page count and metadata from the PDF at `path`.
    ///
    /// Blocking; the file is only opened for reading.
    pub fn extract(&self, path: &Path) -> Result<PdfExtractResult, ExtractError> {
        info!("Extracting text from PDF: {}", path.display());

        if !path.is_file() {
            error!("PDF file not found: {}", path.display());
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let result = self.extract_from_mem(&bytes, path)?;

        debug!(
            "Extracted {} characters from {} pages",
            result.text.len(),
            result.pages
        );
        Ok(result)
    }

    fn extract_from_mem(&self, bytes: &[u8], path: &Path) -> Result<PdfExtractResult, ExtractError> {
        let document = Document::load_mem(bytes).map_err(|e| {
            error!("Invalid PDF file {}: {}", path.display(), e);
            ExtractError::Malformed(e.to_string())
        })?;

        let pages = document.get_pages().len();
        let metadata = read_info_dictionary(&document);

        let range = match self.page_range {
            Some(range) => range.clamp(pages),
            None => 0..pages,
        };

        let text = if range.is_empty() {
            String::new()
        } else {
            let page_texts = extract_page_texts(bytes)?;
            range
                .map(|i| page_texts.get(i).map(String::as_str).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(PAGE_SEPARATOR)
        };

        Ok(PdfExtractResult {
            text,
            path: path.to_path_buf(),
            pages,
            metadata,
        })
    }
}

/// Text of every page, in page order.
fn extract_page_texts(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    // pdf-extract panics on some malformed content streams
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Malformed(e.to_string())),
        Err(_) => Err(ExtractError::Malformed(
            "text layer could not be decoded".to_string(),
        )),
    }
}

/// Collect the trailer's Info dictionary as string pairs.
fn read_info_dictionary(document: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let Ok(info) = document.trailer.get(b"Info") else {
        return metadata;
    };
    let Some(Object::Dictionary(dict)) = resolve(document, info) else {
        return metadata;
    };

    for (key, value) in dict.iter() {
        let key = String::from_utf8_lossy(key);
        let key = key.trim_start_matches('/').to_string();
        if let Some(value) = resolve(document, value) {
            metadata.insert(key, object_to_string(value));
        }
    }

    metadata
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn object_to_string(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Null => String::new(),
        Object::Array(items) => items
            .iter()
            .map(object_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => format!("{:?}", other),
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, otherwise
/// UTF-8 with a Latin-1 fallback for PDFDocEncoding.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_is_clamped_to_document() {
        assert_eq!(PageRange::new(0, 10).clamp(3), 0..3);
        assert_eq!(PageRange::new(1, 2).clamp(3), 1..2);
        assert_eq!(PageRange::new(5, 8).clamp(3), 3..3);
        assert_eq!(PageRange::new(2, 1).clamp(3), 1..1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        let err = PdfExtractor::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(p) if p == path));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfExtractor::default().extract(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();
        let err = PdfExtractor::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn text_strings_are_decoded() {
        assert_eq!(decode_text_string(b"Quarterly"), "Quarterly");
        assert_eq!(
            decode_text_string(&[0xFE, 0xFF, 0x00, 0x51, 0x00, 0x31]),
            "Q1"
        );
        assert_eq!(decode_text_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    #[test]
    fn scalar_objects_are_stringified() {
        assert_eq!(object_to_string(&Object::Integer(3)), "3");
        assert_eq!(object_to_string(&Object::Boolean(true)), "true");
        assert_eq!(object_to_string(&Object::Name(b"Trapped".to_vec())), "Trapped");
    }

    #[test]
    fn blank_metadata_values_are_ignored() {
        let mut metadata = BTreeMap::new();
        metadata.insert("Title".to_string(), "  ".to_string());
        metadata.insert("Author".to_string(), "Ada".to_string());
        let result = PdfExtractResult {
            text: String::new(),
            path: PathBuf::from("a.pdf"),
            pages: 0,
            metadata,
        };
        assert_eq!(result.metadata_value("Title"), None);
        assert_eq!(result.metadata_value("Author"), Some("Ada"));
        assert_eq!(result.metadata_value("Subject"), None);
    }
}
