//! Error types for the `finrag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in retrieval and analysis operations.
///
/// Every failure mode surfaces as a distinct variant so that callers can
/// render per-kind guidance instead of matching on message strings.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document text is malformed or empty. Not retried.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The document bytes carry no extractable text layer (for example a
    /// scanned-image PDF). Not retried.
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    /// The embedding service failed after retry exhaustion.
    #[error("embedding service error ({provider}): {message}")]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// The last underlying failure.
        message: String,
    },

    /// The language model failed after retry exhaustion.
    #[error("answer generation error ({provider}): {message}")]
    AnswerGeneration {
        /// The chat model provider that produced the error.
        provider: String,
        /// The last underlying failure.
        message: String,
    },

    /// An error occurred in the vector index.
    #[error("vector index error: {0}")]
    Index(String),

    /// A query was issued before any document was ingested.
    #[error("the index is empty: ingest at least one document before querying")]
    EmptyIndex,

    /// The session's query quota for the current window is spent.
    #[error("rate limit exceeded: retry in {retry_after:?}")]
    RateLimitExceeded {
        /// Time remaining until the current window resets.
        retry_after: Duration,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for retrieval and analysis operations.
pub type Result<T> = std::result::Result<T, RagError>;
