//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — raw character-windowed split with configurable overlap
//! - [`WordBoundaryChunker`] — boundary-preserving split that never cuts mid-word
//!
//! Chunking is a pure function of the document text and the chunker
//! configuration. All sizes and offsets are measured in characters, not
//! bytes, so multi-byte text is never cut inside a code point.

use std::collections::HashMap;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Chunks carry the parent document's `company`, `doc_type`, and
    /// `source` labels in their metadata plus a `chunk_index` field.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidDocument`] if the document text is empty.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Byte offset of every character boundary in `text`, with a trailing
/// entry for the end of the string.
fn char_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    boundaries
}

fn make_chunk(
    document: &Document,
    chunk_index: usize,
    char_offset: usize,
    text: &str,
) -> Chunk {
    let mut metadata = HashMap::new();
    metadata.insert("company".to_string(), document.company.clone());
    metadata.insert("doc_type".to_string(), document.doc_type.clone());
    metadata.insert("source".to_string(), document.filename.clone());
    metadata.insert("chunk_index".to_string(), chunk_index.to_string());

    Chunk {
        id: format!("{}_{chunk_index}", document.id),
        text: text.to_string(),
        document_id: document.id.clone(),
        chunk_index,
        char_offset,
        metadata,
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Consecutive chunk offsets advance by exactly `chunk_size - chunk_overlap`
/// characters; the final chunk may be shorter than `chunk_size`. This is a
/// raw character split: words may be cut at window edges. Use
/// [`WordBoundaryChunker`] when that matters.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — number of characters per chunk window
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.raw_text.is_empty() {
            return Err(RagError::InvalidDocument(format!(
                "document '{}' has no text content",
                document.filename
            )));
        }

        let text = &document.raw_text;
        let boundaries = char_boundaries(text);
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            let chunk_text = &text[boundaries[start]..boundaries[end]];
            chunks.push(make_chunk(document, chunk_index, start, chunk_text));

            chunk_index += 1;
            let step = self.chunk_size.saturating_sub(self.chunk_overlap);
            if step == 0 {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }
}

/// Splits text into chunks of at most `chunk_size` characters without
/// cutting words.
///
/// The window end backs off to the last whitespace boundary inside the
/// window, and the overlapped start of the next chunk snaps back to the
/// start of the word it would otherwise cut. A single word longer than the
/// window falls back to a raw character split. Because boundaries shift to
/// whitespace, the effective overlap is approximate rather than exact.
#[derive(Debug, Clone)]
pub struct WordBoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WordBoundaryChunker {
    /// Create a new `WordBoundaryChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — approximate overlap between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for WordBoundaryChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.raw_text.is_empty() {
            return Err(RagError::InvalidDocument(format!(
                "document '{}' has no text content",
                document.filename
            )));
        }

        let text = &document.raw_text;
        let boundaries = char_boundaries(text);
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total_chars {
            let raw_end = (start + self.chunk_size).min(total_chars);
            let mut end = raw_end;

            // Back the window end off to the last whitespace so no word is
            // cut. A window filled by a single word keeps the raw end.
            if end < total_chars && !chars[end].is_whitespace() && !chars[end - 1].is_whitespace() {
                if let Some(ws) = (start..end).rev().find(|&i| chars[i].is_whitespace()) {
                    end = ws + 1;
                }
            }

            let chunk_text = &text[boundaries[start]..boundaries[end]];
            chunks.push(make_chunk(document, chunk_index, start, chunk_text));
            chunk_index += 1;

            if end >= total_chars {
                break;
            }

            // Snap the overlapped start of the next chunk back to a word start.
            let mut next = end.saturating_sub(self.chunk_overlap);
            while next > start && next < total_chars && !chars[next - 1].is_whitespace() {
                next -= 1;
            }
            if next <= start {
                next = end;
            }
            start = next;
        }

        Ok(chunks)
    }
}
