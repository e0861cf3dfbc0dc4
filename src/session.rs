//! Session context: the owner of all per-user mutable state.
//!
//! A [`Session`] owns its documents, vector index, rate limiter, and
//! statistics. Sessions are fully independent of one another (there is no
//! process-wide state) and nothing outlives the session value. Each query
//! runs the synchronous embed → retrieve → compose pipeline; the rate
//! limiter is checked before any external call is made.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::composer::AnswerComposer;
use crate::config::RagConfig;
use crate::document::{Answer, Document, IndexEntry, RetrievalResult, content_hash};
use crate::embedding::EmbeddingProvider;
use crate::entity::{EntityDetector, NameMatchDetector, company_from_filename};
use crate::error::{RagError, Result};
use crate::extract::{ExtractedText, TextExtractor};
use crate::index::VectorIndex;
use crate::inmemory::InMemoryIndex;
use crate::model::ChatModel;
use crate::retrieval::{Retriever, known_companies};

/// Fixed-window query rate limiter.
///
/// Admits up to `max_queries` per window; the window resets `window` after
/// its first admitted query. Exceeding the quota fails fast: there is no
/// queuing, the caller waits and retries.
#[derive(Debug)]
pub struct RateLimiter {
    max_queries: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    /// Create a limiter admitting `max_queries` per `window`.
    pub fn new(max_queries: u32, window: Duration) -> Self {
        Self { max_queries, window, count: 0, window_start: Instant::now() }
    }

    /// Admit one query, or fail with the time remaining in the window.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RateLimitExceeded`] when the quota for the
    /// current window is spent.
    pub fn admit(&mut self) -> Result<()> {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            self.count = 0;
            self.window_start = Instant::now();
        }

        if self.count >= self.max_queries {
            let retry_after = self.window.saturating_sub(self.window_start.elapsed());
            return Err(RagError::RateLimitExceeded { retry_after });
        }

        self.count += 1;
        Ok(())
    }

    /// Queries still admissible in the current window.
    pub fn remaining(&self) -> u32 {
        if self.window_start.elapsed() >= self.window {
            self.max_queries
        } else {
            self.max_queries.saturating_sub(self.count)
        }
    }
}

/// Counters for the life of a session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Documents successfully ingested.
    pub documents_processed: u64,
    /// Questions answered.
    pub queries_asked: u64,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
}

/// The result of an ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The document was chunked, embedded, and indexed.
    Added {
        /// ID assigned to the new document.
        document_id: String,
        /// Number of chunks indexed for it.
        chunk_count: usize,
    },
    /// A document with identical content is already loaded; nothing was
    /// ingested.
    DuplicateSkipped,
}

/// A user session: loaded documents, vector index, rate limiter, and the
/// retrieval/composition pipeline.
///
/// Construct one via [`Session::builder()`].
pub struct Session {
    id: String,
    config: RagConfig,
    documents: Vec<Document>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    retriever: Retriever,
    composer: AnswerComposer,
    limiter: RateLimiter,
    stats: SessionStats,
}

impl Session {
    /// Create a new [`SessionBuilder`].
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// The session's unique ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The documents currently loaded, in ingestion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Distinct company labels across loaded documents, in ingestion order.
    pub fn companies(&self) -> Vec<String> {
        known_companies(&self.documents)
    }

    /// Session counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Queries still admissible in the current rate-limit window.
    pub fn queries_remaining(&self) -> u32 {
        self.limiter.remaining()
    }

    /// Ingest an uploaded file: extract text, then chunk, embed, and index it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidDocument`] for oversized files,
    /// [`RagError::UnsupportedDocument`] from the extractor for files
    /// without a text layer, and propagates chunking/embedding/index
    /// failures.
    pub async fn ingest_bytes(
        &mut self,
        filename: &str,
        doc_type: &str,
        bytes: &[u8],
        extractor: &dyn TextExtractor,
    ) -> Result<IngestOutcome> {
        if bytes.len() > self.config.max_document_bytes {
            return Err(RagError::InvalidDocument(format!(
                "'{filename}' is {} bytes; the limit is {}",
                bytes.len(),
                self.config.max_document_bytes
            )));
        }

        let extracted = extractor.extract(bytes)?;
        self.ingest_extracted(filename, doc_type, extracted).await
    }

    /// Ingest already-extracted text under the given filename and document
    /// type label.
    ///
    /// The company label is derived from the filename. Content identical to
    /// an already-loaded document is skipped
    /// ([`IngestOutcome::DuplicateSkipped`]).
    pub async fn ingest_extracted(
        &mut self,
        filename: &str,
        doc_type: &str,
        extracted: ExtractedText,
    ) -> Result<IngestOutcome> {
        let hash = content_hash(&extracted.text);
        if self.documents.iter().any(|d| d.content_hash == hash) {
            info!(filename, "skipping ingestion: identical content already loaded");
            return Ok(IngestOutcome::DuplicateSkipped);
        }

        let document = Document {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            company: company_from_filename(filename),
            doc_type: doc_type.to_string(),
            raw_text: extracted.text,
            page_count: extracted.page_count,
            content_hash: hash,
            ingested_at: Utc::now(),
        };

        let chunks = self.chunker.chunk(&document)?;

        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.max_embed_batch) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != texts.len() {
                return Err(RagError::EmbeddingService {
                    provider: "embedding provider".to_string(),
                    message: format!(
                        "returned {} embeddings for {} inputs",
                        embeddings.len(),
                        texts.len()
                    ),
                });
            }
            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| IndexEntry { chunk, embedding }),
            );
        }

        self.index.upsert(entries).await?;

        let chunk_count = chunks.len();
        info!(
            document.id = %document.id,
            filename,
            company = %document.company,
            chunk_count,
            "ingested document"
        );

        let document_id = document.id.clone();
        self.documents.push(document);
        self.stats.documents_processed += 1;

        Ok(IngestOutcome::Added { document_id, chunk_count })
    }

    /// Answer a question over the loaded documents.
    ///
    /// Runs the full pipeline: rate-limit admission, retrieval (standard or
    /// balanced, depending on how many loaded companies the question
    /// mentions), then answer composition with citations.
    ///
    /// # Errors
    ///
    /// Fails fast with [`RagError::RateLimitExceeded`] before any external
    /// call when the window quota is spent, with
    /// [`RagError::EmptyIndex`] when no document is loaded, and propagates
    /// embedding/model failures.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let (answer, _) = self.ask_with_sources(question).await?;
        Ok(answer)
    }

    /// Answer a question and also return the retrieval result that backed it.
    pub async fn ask_with_sources(&mut self, question: &str) -> Result<(Answer, RetrievalResult)> {
        self.limiter.admit()?;

        let retrieval = self.retriever.retrieve(question, &self.documents).await?;
        let answer = self.composer.compose(question, &retrieval).await?;

        self.stats.queries_asked += 1;
        Ok((answer, retrieval))
    }

    /// Remove one document and every index entry derived from it.
    ///
    /// Returns the number of index entries removed; 0 if the document is
    /// not loaded (not an error).
    pub async fn remove_document(&mut self, document_id: &str) -> Result<usize> {
        let removed = self.index.delete_by_document(document_id).await?;
        self.documents.retain(|d| d.id != document_id);
        if removed == 0 {
            warn!(document_id, "remove_document: no entries found");
        }
        Ok(removed)
    }

    /// Clear the session: remove every document and its index entries.
    pub async fn clear(&mut self) -> Result<()> {
        for document in std::mem::take(&mut self.documents) {
            self.index.delete_by_document(&document.id).await?;
        }
        info!(session.id = %self.id, "session cleared");
        Ok(())
    }
}

/// Builder for constructing a [`Session`].
///
/// The embedding provider and chat model are required; everything else has
/// a default (in-memory index, fixed-size chunker from the config's window
/// parameters, name-match entity detection).
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    chunker: Option<Arc<dyn Chunker>>,
    detector: Option<Arc<dyn EntityDetector>>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl SessionBuilder {
    /// Set the session configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider (required).
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the chat model (required).
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Set the document chunker. Defaults to a [`FixedSizeChunker`] using
    /// the config's window parameters.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the entity detection strategy. Defaults to [`NameMatchDetector`].
    pub fn entity_detector(mut self, detector: Arc<dyn EntityDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Set the vector index backend. Defaults to [`InMemoryIndex`].
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`Session`], validating that required components are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the embedding provider or chat model
    /// is missing.
    pub fn build(self) -> Result<Session> {
        let config = self.config.unwrap_or_default();
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::Config("chat_model is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let detector = self.detector.unwrap_or_else(|| Arc::new(NameMatchDetector));
        let index = self.index.unwrap_or_else(|| Arc::new(InMemoryIndex::new()));

        let retriever =
            Retriever::new(Arc::clone(&embedder), Arc::clone(&index), detector, config.clone());
        let composer = AnswerComposer::new(chat_model, config.max_context_chars);
        let limiter = RateLimiter::new(config.max_queries_per_window, config.rate_limit_window);

        Ok(Session {
            id: Uuid::new_v4().to_string(),
            documents: Vec::new(),
            index,
            embedder,
            chunker,
            retriever,
            composer,
            limiter,
            stats: SessionStats {
                documents_processed: 0,
                queries_asked: 0,
                started_at: Utc::now(),
            },
            config,
        })
    }
}
