//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source document ingested into a session.
///
/// Created on ingestion and destroyed when the session removes it or is
/// cleared. `content_hash` is a hash of `raw_text` used to skip
/// re-ingestion of identical content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The filename the document was uploaded under.
    pub filename: String,
    /// The company label this document reports on (derived from the
    /// filename or supplied by the caller).
    pub company: String,
    /// The document type label (for example "10-K" or "Earnings Call").
    pub doc_type: String,
    /// The extracted text content of the document.
    pub raw_text: String,
    /// Number of pages reported by the text extractor.
    pub page_count: usize,
    /// Hash of `raw_text`, used for the duplicate-ingestion guard.
    pub content_hash: u64,
    /// When the document was ingested.
    pub ingested_at: DateTime<Utc>,
}

/// Hash document text for the duplicate-ingestion guard.
pub(crate) fn content_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// A fixed-size overlapping segment of a [`Document`], the unit of retrieval.
///
/// Chunks are derived deterministically from a document and are immutable
/// once created. Chunk IDs are generated as `{document_id}_{chunk_index}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Zero-based position of this chunk within its document.
    pub chunk_index: usize,
    /// Character offset of the chunk start within the document text.
    pub char_offset: usize,
    /// Key-value metadata inherited from the parent document plus
    /// chunk-specific fields.
    pub metadata: HashMap<String, String>,
}

/// A chunk paired with its embedding, as stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The stored chunk.
    pub chunk: Chunk,
    /// The embedding vector for the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
    /// The company label of the chunk's source document.
    pub company: String,
}

/// Which retrieval strategy produced a [`RetrievalResult`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Single top-k search over the whole index.
    Standard,
    /// Forced balanced retrieval: one quota-bounded search per detected
    /// company, merged in detection order.
    Balanced,
}

/// The outcome of a retrieval pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Retrieved chunks. Standard mode orders by descending score;
    /// balanced mode preserves per-company ranking grouped in the order
    /// companies were detected in the query.
    pub hits: Vec<ScoredChunk>,
    /// The strategy that produced these hits.
    pub mode: RetrievalMode,
    /// Companies detected in the query for which no chunks were retrieved.
    /// Non-empty only in balanced mode; the query still proceeds with the
    /// available data.
    pub missing_entities: Vec<String>,
}

/// A mapping from a generated answer back to a source chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    /// The source document ID.
    pub document_id: String,
    /// The company label of the source document.
    pub company: String,
    /// The chunk index within the source document.
    pub chunk_index: usize,
}

/// A generated answer with the sources it drew from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text.
    pub text: String,
    /// Source citations for the chunks included in the prompt context,
    /// in context order.
    pub citations: Vec<Citation>,
}
