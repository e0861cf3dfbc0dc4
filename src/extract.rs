//! Document ingestion boundary: text extraction from uploaded bytes.
//!
//! Text extraction is a collaborator, not part of the core: a PDF parser
//! lives behind the [`TextExtractor`] trait. The crate ships
//! [`PlainTextExtractor`] for plain-text input and tests.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Text extracted from an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedText {
    /// The extracted text content.
    pub text: String,
    /// Number of pages in the source file.
    pub page_count: usize,
}

/// Extracts text from raw file bytes.
pub trait TextExtractor: Send + Sync {
    /// Extract text from the file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedDocument`] when the bytes carry no
    /// extractable text layer (for example a scanned-image PDF).
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText>;
}

/// A passthrough extractor for UTF-8 text input.
///
/// Pages are delimited by form feeds, matching the convention of common
/// PDF-to-text converters. PDF bytes are rejected: parsing them is the job
/// of an external extractor implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        if bytes.starts_with(b"%PDF") {
            return Err(RagError::UnsupportedDocument(
                "PDF input requires an external text extractor".to_string(),
            ));
        }

        let text = std::str::from_utf8(bytes).map_err(|_| {
            RagError::UnsupportedDocument(
                "file has no text layer (binary or non-UTF-8 content)".to_string(),
            )
        })?;

        let page_count = text.split('\u{0c}').count();
        Ok(ExtractedText { text: text.to_string(), page_count })
    }
}
