//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryIndex`] keeps entries in insertion order inside a
//! `tokio::sync::RwLock`, which gives the required reader-writer
//! discipline: searches take the shared lock, mutations the exclusive one.
//! Everything is memory-scoped to the owning session; nothing persists.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::document::{IndexEntry, ScoredChunk};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

#[derive(Debug, Default)]
struct IndexState {
    /// Entries in insertion order. Ties on score resolve to this order.
    entries: Vec<IndexEntry>,
    /// Pinned on first upsert; fixed for the life of the index.
    dimensions: Option<usize>,
}

/// An in-memory vector index using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    state: tokio::sync::RwLock<IndexState>,
}

impl InMemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;

        // Validate the whole batch before touching the index: a rejected
        // batch must leave no trace, including the dimension pin.
        let dims = state.dimensions.unwrap_or(entries[0].embedding.len());
        for entry in &entries {
            if entry.embedding.is_empty() {
                return Err(RagError::Index(format!(
                    "chunk '{}' has an empty embedding",
                    entry.chunk.id
                )));
            }
            if entry.embedding.len() != dims {
                return Err(RagError::Index(format!(
                    "chunk '{}' has dimension {} but the index is pinned to {dims}",
                    entry.chunk.id,
                    entry.embedding.len()
                )));
            }
        }
        state.dimensions = Some(dims);

        let added = entries.len();
        state.entries.extend(entries);
        debug!(added, total = state.entries.len(), "upserted index entries");
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashSet<String>>,
    ) -> Result<Vec<ScoredChunk>> {
        let state = self.state.read().await;
        if state.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let mut scored: Vec<ScoredChunk> = state
            .entries
            .iter()
            .filter(|entry| {
                filter.is_none_or(|allowed| allowed.contains(&entry.chunk.document_id))
            })
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
                company: entry
                    .chunk
                    .metadata
                    .get("company")
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        // Stable sort: equal scores keep insertion order, which also keeps
        // chunk_index order within a document.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<usize> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|entry| entry.chunk.document_id != document_id);
        let removed = before - state.entries.len();
        if state.entries.is_empty() {
            // An empty index accepts any dimensionality again.
            state.dimensions = None;
        }
        debug!(document_id, removed, remaining = state.entries.len(), "deleted index entries");
        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}
