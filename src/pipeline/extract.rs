//! Input resolution and text extraction.
//!
//! A document reaches the pipeline in one of three ways: a local path, an
//! HTTP(S) URL, or bytes uploaded through the web UI. All three end up as a
//! [`SourceDocument`] (a display name plus raw bytes), which is then
//! classified and turned into plain text.
//!
//! PDF text comes from `pdf-extract`. It is CPU-bound and can panic on
//! unusual documents, so it runs on the blocking pool where a panic becomes
//! a `JoinError` we can report instead of taking the server down.
//!
//! Extracted text is tidied by a few deterministic rules before prompting:
//! the model does not need form feeds, zero-width spaces or forty blank
//! lines between pages.

use crate::error::McqGenError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What kind of document the bytes hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

/// A document as received, before extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name or URL, used in messages and for extension sniffing.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a local path or an HTTP(S) URL.
pub async fn load(input: &str, timeout_secs: u64) -> Result<SourceDocument, McqGenError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<SourceDocument, McqGenError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => McqGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => McqGenError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(SourceDocument::new(path.display().to_string(), bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, McqGenError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| McqGenError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            McqGenError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            McqGenError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(McqGenError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| McqGenError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(SourceDocument::new(url_file_name(url), bytes.to_vec()))
}

/// Last path segment of a URL when it looks like a file name, else the URL.
fn url_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| url.to_string())
}

/// Classify a document by magic bytes, then extension, then encoding.
pub fn detect_kind(doc: &SourceDocument) -> Result<DocumentKind, McqGenError> {
    if doc.bytes.starts_with(b"%PDF") {
        return Ok(DocumentKind::Pdf);
    }
    let ext = PathBuf::from(&doc.name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    if ext.as_deref() == Some("pdf") {
        return Ok(DocumentKind::Pdf);
    }
    if std::str::from_utf8(&doc.bytes).is_ok() {
        return Ok(DocumentKind::Text);
    }
    Err(McqGenError::UnsupportedFormat {
        name: doc.name.clone(),
    })
}

/// Extract and clean the text of a document.
pub async fn extract_text(doc: &SourceDocument) -> Result<String, McqGenError> {
    let raw = match detect_kind(doc)? {
        DocumentKind::Pdf => extract_pdf(doc).await?,
        DocumentKind::Text => String::from_utf8_lossy(&doc.bytes).into_owned(),
    };

    let text = clean_text(&raw);
    if text.trim().is_empty() {
        return Err(McqGenError::EmptyDocument {
            name: doc.name.clone(),
        });
    }
    debug!("Extracted {} chars from {}", text.chars().count(), doc.name);
    Ok(text)
}

async fn extract_pdf(doc: &SourceDocument) -> Result<String, McqGenError> {
    let bytes = doc.bytes.clone();
    let name = doc.name.clone();

    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| McqGenError::PdfExtractionFailed {
            name: name.clone(),
            detail: format!("extractor panicked: {e}"),
        })?
        .map_err(|e| McqGenError::PdfExtractionFailed {
            name,
            detail: e.to_string(),
        })
}

// ── Text cleanup ─────────────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalise extracted text for prompting.
///
/// 1. CRLF / CR / form feed → LF
/// 2. Strip BOM and invisible characters
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ newlines to one blank line
pub fn clean_text(input: &str) -> String {
    let s = input
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n")
        .replace(
            ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
            "",
        );
    let s = s
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_LINES.replace_all(s.trim(), "\n\n").into_owned()
}

/// The first `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.txt"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_file_name_prefers_last_segment() {
        assert_eq!(url_file_name("https://x.org/papers/cell.pdf"), "cell.pdf");
        assert_eq!(url_file_name("https://x.org/papers/"), "https://x.org/papers/");
        assert_eq!(url_file_name("https://x.org/abs/1706"), "https://x.org/abs/1706");
    }

    #[test]
    fn detect_pdf_by_magic() {
        let doc = SourceDocument::new("upload", b"%PDF-1.7 ...".to_vec());
        assert_eq!(detect_kind(&doc).unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn detect_pdf_by_extension() {
        let doc = SourceDocument::new("Notes.PDF", vec![0xff, 0x00]);
        assert_eq!(detect_kind(&doc).unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn detect_text() {
        let doc = SourceDocument::new("notes.txt", "plain words".as_bytes().to_vec());
        assert_eq!(detect_kind(&doc).unwrap(), DocumentKind::Text);
    }

    #[test]
    fn binary_is_unsupported() {
        let doc = SourceDocument::new("photo.png", vec![0x89, b'P', b'N', b'G', 0xff, 0xfe]);
        assert!(matches!(
            detect_kind(&doc),
            Err(McqGenError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn text_document_extracts_cleaned() {
        let doc = SourceDocument::new(
            "a.txt",
            b"\xEF\xBB\xBFLine one  \r\n\r\n\r\n\r\nLine two".to_vec(),
        );
        assert_eq!(extract_text(&doc).await.unwrap(), "Line one\n\nLine two");
    }

    #[tokio::test]
    async fn blank_text_document_is_empty_error() {
        let doc = SourceDocument::new("blank.txt", b"  \n\n \t\n".to_vec());
        assert!(matches!(
            extract_text(&doc).await,
            Err(McqGenError::EmptyDocument { .. })
        ));
    }

    #[tokio::test]
    async fn broken_pdf_is_extraction_error() {
        let doc = SourceDocument::new(
            "broken.pdf",
            b"%PDF-1.4 this is not really a pdf".to_vec(),
        );
        assert!(matches!(
            extract_text(&doc).await,
            Err(McqGenError::PdfExtractionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = load("/no/such/dir/notes.txt", 5).await.unwrap_err();
        assert!(matches!(err, McqGenError::FileNotFound { .. }));
    }

    #[test]
    fn clean_text_rules() {
        assert_eq!(clean_text("a\u{200B}b\u{000C}c"), "ab\nc");
        assert_eq!(clean_text("x\n\n\n\n\ny"), "x\n\ny");
        assert_eq!(clean_text("  first\nlast   "), "first\nlast");
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 3), "");
    }
}
