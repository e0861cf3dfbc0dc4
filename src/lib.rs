//! # finrag
//!
//! Retrieval-augmented question answering over financial documents
//! (10-Ks, earnings calls, analyst reports), with a comparative-analysis
//! mode that retrieves a balanced set of excerpts per company.
//!
//! Documents are chunked, embedded, and held in a session-scoped in-memory
//! vector index. A question is embedded, matched against the index, and the
//! retrieved excerpts are passed to a chat model to produce a cited answer.
//! When a question mentions two or more loaded companies, retrieval runs
//! one quota-bounded search per company (pre-filtered to that company's
//! documents) so that no company's filings dominate the context.
//!
//! ## Components
//!
//! - [`Session`] — per-user context owning documents, index, rate limiter,
//!   and the query pipeline
//! - [`Chunker`] / [`FixedSizeChunker`] / [`WordBoundaryChunker`] — document
//!   splitting
//! - [`EmbeddingProvider`] / [`ChatModel`] — external service boundaries
//! - [`VectorIndex`] / [`InMemoryIndex`] — cosine-similarity search with
//!   cascading delete by document
//! - [`Retriever`] — standard vs. forced-balanced retrieval orchestration
//! - [`AnswerComposer`] — bounded prompt assembly, model invocation,
//!   citations
//!
//! OpenAI-backed implementations of both service boundaries are available
//! behind the `openai` feature.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use finrag::{PlainTextExtractor, RagConfig, Session};
//! use finrag::openai::{OpenAiChatModel, OpenAiEmbeddingProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = Session::builder()
//!         .config(RagConfig::default())
//!         .embedding_provider(Arc::new(OpenAiEmbeddingProvider::from_env()?))
//!         .chat_model(Arc::new(OpenAiChatModel::from_env()?))
//!         .build()?;
//!
//!     session
//!         .ingest_bytes("10-K TESLA.txt", "10-K", &tesla_bytes, &PlainTextExtractor)
//!         .await?;
//!     session
//!         .ingest_bytes("10-K APPLE.txt", "10-K", &apple_bytes, &PlainTextExtractor)
//!         .await?;
//!
//!     let answer = session.ask("Compare Tesla and Apple revenue growth").await?;
//!     println!("{}", answer.text);
//!     for citation in &answer.citations {
//!         println!("  [{} chunk {}]", citation.company, citation.chunk_index);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod entity;
pub mod error;
pub mod extract;
pub mod index;
pub mod inmemory;
pub mod model;
pub mod retrieval;
pub mod retry;
pub mod session;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, WordBoundaryChunker};
pub use composer::AnswerComposer;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Answer, Chunk, Citation, Document, IndexEntry, RetrievalMode, RetrievalResult, ScoredChunk,
};
pub use embedding::EmbeddingProvider;
pub use entity::{EntityDetector, NameMatchDetector, company_from_filename};
pub use error::{RagError, Result};
pub use extract::{ExtractedText, PlainTextExtractor, TextExtractor};
pub use index::VectorIndex;
pub use inmemory::InMemoryIndex;
pub use model::ChatModel;
pub use retrieval::{Query, Retriever};
pub use retry::RetryPolicy;
pub use session::{IngestOutcome, RateLimiter, Session, SessionBuilder, SessionStats};
