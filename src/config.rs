//! Configuration for the analysis session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for chunking, retrieval, and session limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from a standard retrieval.
    pub top_k: usize,
    /// Minimum per-company result quota in balanced retrieval. The
    /// effective quota is `max(min_entity_quota, ceil(top_k / companies))`.
    pub min_entity_quota: usize,
    /// Minimum similarity score for results (results below this are filtered out).
    pub similarity_threshold: f32,
    /// Maximum total characters of chunk text included in a prompt.
    pub max_context_chars: usize,
    /// Maximum accepted document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum number of texts sent to the embedding service per request.
    pub max_embed_batch: usize,
    /// Number of queries allowed per rate-limit window.
    pub max_queries_per_window: u32,
    /// Length of the rate-limit window.
    pub rate_limit_window: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            min_entity_quota: 3,
            similarity_threshold: 0.0,
            max_context_chars: 12_000,
            max_document_bytes: 10 * 1024 * 1024,
            max_embed_batch: 64,
            max_queries_per_window: 10,
            rate_limit_window: Duration::from_secs(3600),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the chunk window size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results returned by standard retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum per-company quota used in balanced retrieval.
    pub fn min_entity_quota(mut self, quota: usize) -> Self {
        self.config.min_entity_quota = quota;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum total characters of chunk text in a prompt.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Set the maximum accepted document size in bytes.
    pub fn max_document_bytes(mut self, bytes: usize) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    /// Set the maximum embedding batch size per request.
    pub fn max_embed_batch(mut self, batch: usize) -> Self {
        self.config.max_embed_batch = batch;
        self
    }

    /// Set the number of queries allowed per rate-limit window.
    pub fn max_queries_per_window(mut self, queries: u32) -> Self {
        self.config.max_queries_per_window = queries;
        self
    }

    /// Set the length of the rate-limit window.
    pub fn rate_limit_window(mut self, window: Duration) -> Self {
        self.config.rate_limit_window = window;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `min_entity_quota == 0`
    /// - `max_context_chars == 0` or `max_embed_batch == 0`
    /// - `max_queries_per_window == 0`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if config.min_entity_quota == 0 {
            return Err(RagError::Config("min_entity_quota must be greater than zero".to_string()));
        }
        if config.max_context_chars == 0 {
            return Err(RagError::Config("max_context_chars must be greater than zero".to_string()));
        }
        if config.max_embed_batch == 0 {
            return Err(RagError::Config("max_embed_batch must be greater than zero".to_string()));
        }
        if config.max_queries_per_window == 0 {
            return Err(RagError::Config(
                "max_queries_per_window must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
