//! Document Text Extractor: turns an uploaded résumé into plain text.
//!
//! Total function: a PDF text layer is preferred, anything that fails to parse
//! falls back to a lossy UTF-8 decode of the raw bytes.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PdfTextLayer,
    PlainText,
    /// Structured extraction failed; text is a best-effort decode and may be noisy.
    RawDecode,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
}

impl ExtractedText {
    pub fn is_degraded(&self) -> bool {
        self.method == ExtractionMethod::RawDecode
    }
}

/// Extracts text from `data`. Never fails; the worst case is an empty string.
pub async fn extract_text(data: Bytes, content_type: Option<&str>) -> ExtractedText {
    let declared = content_type.unwrap_or("application/octet-stream");

    if declared.starts_with("text/") {
        return ExtractedText {
            text: decode_lossy(&data),
            method: ExtractionMethod::PlainText,
        };
    }

    // pdf-extract is CPU-bound and can panic on malformed input, so it runs on
    // the blocking pool; a panic surfaces as a JoinError. The parser and its
    // copy of the buffer are dropped before the task returns.
    let buffer = data.clone();
    let parsed = tokio::task::spawn_blocking(move || {
        let result = pdf_extract::extract_text_from_mem(&buffer);
        drop(buffer);
        result.map_err(|e| e.to_string())
    })
    .await;

    match parsed {
        Ok(Ok(text)) => {
            debug!("Extracted {} chars from PDF text layer", text.len());
            ExtractedText {
                text,
                method: ExtractionMethod::PdfTextLayer,
            }
        }
        Ok(Err(reason)) => fallback(&data, declared, &reason),
        Err(join_error) => fallback(&data, declared, &join_error.to_string()),
    }
}

fn fallback(data: &[u8], declared: &str, reason: &str) -> ExtractedText {
    warn!(
        "PDF parsing failed for {declared} upload ({reason}). Falling back to raw text extraction."
    );
    ExtractedText {
        text: decode_lossy(data),
        method: ExtractionMethod::RawDecode,
    }
}

/// UTF-8 decode with replacement characters; NULs stripped. Whitespace-only
/// output collapses to an empty string.
fn decode_lossy(data: &[u8]) -> String {
    let text: String = String::from_utf8_lossy(data)
        .chars()
        .filter(|c| *c != '\0')
        .collect();
    if text.trim().is_empty() {
        String::new()
    } else {
        text
    }
}
