//! Vector index trait for storing and searching chunk embeddings.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::document::{IndexEntry, ScoredChunk};
use crate::error::Result;

/// A session-scoped store of chunk embeddings with similarity search.
///
/// Implementations hold `(embedding, chunk)` entries and support upserting,
/// cascading deletion by document, and top-k search by cosine similarity.
/// Mutations must be exclusive relative to in-flight searches; concurrent
/// searches need no coordination.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add entries to the index.
    ///
    /// The first upsert pins the index dimensionality; entries whose
    /// embedding length differs from it are rejected. Re-upserting an
    /// identical document is not deduplicated here; that guard lives at
    /// the session layer.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Return up to `k` entries nearest to `embedding` by cosine
    /// similarity, in descending score order. Ties break by insertion
    /// order, then chunk index.
    ///
    /// When `filter` is set, only entries whose `document_id` is in the
    /// filter set are candidates (pre-filtering: the search runs within
    /// that subset of the index). A filter that matches nothing yields an
    /// empty result, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`](crate::RagError::EmptyIndex) if the
    /// index holds zero entries.
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashSet<String>>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Remove every entry belonging to the given document.
    ///
    /// Returns the number of entries removed; 0 if none were found (not an
    /// error).
    async fn delete_by_document(&self, document_id: &str) -> Result<usize>;

    /// Number of entries currently in the index.
    async fn len(&self) -> usize;

    /// Whether the index holds zero entries.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
