//! Text extraction: turns uploaded resume bytes into plain text.
//!
//! Extraction never fails a request: `extract_or_fallback` degrades unsupported,
//! corrupt, or panicking documents to a lossy UTF-8 decode of the raw bytes, and
//! that decode yields an empty string at worst.

use std::io::{Cursor, Read};
use std::sync::Arc;

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::candidate::Candidate;

/// Path of the main body part inside a DOCX container.
const DOCX_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX container error: {0}")]
    DocxContainer(#[from] zip::result::ZipError),

    #[error("DOCX XML error: {0}")]
    DocxXml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document kinds with a dedicated extractor, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else if lower.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// An uploaded document before extraction.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Format-specific text extraction. Synchronous and CPU-bound; callers run it on
/// the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// PDF via `pdf-extract`, DOCX via its `word/document.xml` part, TXT as UTF-8.
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        match DocumentKind::from_filename(filename) {
            Some(DocumentKind::Pdf) => pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| ExtractionError::Pdf(e.to_string())),
            Some(DocumentKind::Docx) => extract_docx(bytes),
            Some(DocumentKind::Text) => Ok(decode_lossy(bytes)),
            None => Err(ExtractionError::Unsupported(filename.to_string())),
        }
    }
}

/// Extracts every document concurrently and returns candidates in upload order.
pub async fn extract_all(
    extractor: Arc<dyn TextExtractor>,
    documents: Vec<UploadedDocument>,
) -> Vec<Candidate> {
    let tasks = documents.into_iter().map(|document| {
        let extractor = Arc::clone(&extractor);
        async move {
            let raw_text = extract_or_fallback(extractor, &document).await;
            Candidate::new(document.filename, raw_text)
        }
    });

    futures::future::join_all(tasks).await
}

/// Runs `extractor` on the blocking pool, falling back to a lossy decode of the raw
/// bytes on error, unsupported type, or panic.
pub async fn extract_or_fallback(
    extractor: Arc<dyn TextExtractor>,
    document: &UploadedDocument,
) -> String {
    let filename = document.filename.clone().unwrap_or_default();
    let bytes = document.bytes.clone();

    // Some PDF parsers panic on malformed input; the JoinError captures that.
    let outcome = tokio::task::spawn_blocking({
        let filename = filename.clone();
        move || extractor.extract(&filename, &bytes)
    })
    .await;

    match outcome {
        Ok(Ok(text)) => {
            debug!(
                filename = %filename,
                chars = text.chars().count(),
                "Document text extracted"
            );
            text
        }
        Ok(Err(ExtractionError::Unsupported(_))) => {
            debug!(filename = %filename, "No dedicated extractor, decoding raw bytes");
            decode_lossy(&document.bytes)
        }
        Ok(Err(e)) => {
            warn!(filename = %filename, error = %e, "Extraction failed, decoding raw bytes");
            decode_lossy(&document.bytes)
        }
        Err(e) => {
            warn!(filename = %filename, error = %e, "Extractor panicked, decoding raw bytes");
            decode_lossy(&document.bytes)
        }
    }
}

/// UTF-8 decode that drops invalid sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Collects the `<w:t>` text runs of a DOCX body, one line per paragraph.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY_PART)?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Event::Text(t) if in_text_run => current.push_str(&t.unescape()?),
            Event::Empty(e) if e.name().as_ref() == b"w:tab" => current.push('\t'),
            Event::Empty(e) if e.name().as_ref() == b"w:br" => current.push('\n'),
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}
