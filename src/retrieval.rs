//! Retrieval orchestration: standard top-k and forced balanced retrieval.
//!
//! The [`Retriever`] decides the strategy per query. A query mentioning at
//! most one loaded company runs a single top-k search over the whole
//! index. A query mentioning two or more companies is comparative: one
//! quota-bounded search per company, pre-filtered to that company's
//! documents, so that no company's chunks dominate the context purely by
//! being denser or more numerous. Companies with no retrievable chunks are
//! reported rather than failing the query.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::{Document, RetrievalMode, RetrievalResult, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::entity::EntityDetector;
use crate::error::Result;
use crate::index::VectorIndex;

/// Financial metric keywords used to sharpen per-company sub-queries in
/// comparative retrieval.
const METRIC_KEYWORDS: &[&str] = &["revenue", "r&d", "margin", "profit", "risk", "growth"];

/// A query with its detected company mentions, in first-mention order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The raw query text.
    pub text: String,
    /// Loaded company labels mentioned in the text.
    pub detected_entities: Vec<String>,
}

/// Orchestrates retrieval over the vector index.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    detector: Arc<dyn EntityDetector>,
    config: RagConfig,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        detector: Arc<dyn EntityDetector>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, index, detector, config }
    }

    /// Detect which loaded companies a query mentions.
    pub fn parse_query(&self, text: &str, documents: &[Document]) -> Query {
        let known = known_companies(documents);
        let detected_entities = self.detector.detect(text, &known);
        Query { text: text.to_string(), detected_entities }
    }

    /// Retrieve context for a query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`](crate::RagError::EmptyIndex) if no
    /// document has been ingested, and propagates embedding failures.
    pub async fn retrieve(&self, text: &str, documents: &[Document]) -> Result<RetrievalResult> {
        let query = self.parse_query(text, documents);

        if query.detected_entities.len() >= 2 {
            self.retrieve_balanced(&query, documents).await
        } else {
            self.retrieve_standard(&query).await
        }
    }

    /// Single top-k search over the whole index.
    async fn retrieve_standard(&self, query: &Query) -> Result<RetrievalResult> {
        let embedding = self.embedder.embed(&query.text).await?;
        let hits = self.index.search(&embedding, self.config.top_k, None).await?;
        let hits: Vec<ScoredChunk> =
            hits.into_iter().filter(|h| h.score >= self.config.similarity_threshold).collect();

        info!(mode = "standard", hit_count = hits.len(), "retrieval completed");

        Ok(RetrievalResult { hits, mode: RetrievalMode::Standard, missing_entities: Vec::new() })
    }

    /// One quota-bounded, company-filtered search per detected company,
    /// dispatched concurrently and merged in detection order.
    async fn retrieve_balanced(
        &self,
        query: &Query,
        documents: &[Document],
    ) -> Result<RetrievalResult> {
        let entities = &query.detected_entities;
        let quota =
            self.config.top_k.div_ceil(entities.len()).max(self.config.min_entity_quota);
        let metric = detect_metric(&query.text);

        let searches = entities.iter().map(|entity| {
            let doc_ids: HashSet<String> = documents
                .iter()
                .filter(|d| d.company.eq_ignore_ascii_case(entity))
                .map(|d| d.id.clone())
                .collect();
            // The metric keyword sharpens the sub-query ("Tesla revenue");
            // without one the raw query text is embedded as-is.
            let sub_query = match metric {
                Some(metric) => format!("{entity} {metric}"),
                None => query.text.clone(),
            };
            async move {
                let embedding = self.embedder.embed(&sub_query).await?;
                self.index.search(&embedding, quota, Some(&doc_ids)).await
            }
        });

        let per_entity = future::try_join_all(searches).await?;

        let mut hits = Vec::new();
        let mut missing_entities = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (entity, entity_hits) in entities.iter().zip(per_entity) {
            let mut kept = 0usize;
            for hit in entity_hits {
                if hit.score < self.config.similarity_threshold {
                    continue;
                }
                // A chunk retrieved for more than one company keeps only
                // its first occurrence.
                if seen.insert(hit.chunk.id.clone()) {
                    hits.push(hit);
                    kept += 1;
                }
            }
            if kept == 0 {
                warn!(entity = %entity, "no chunks retrieved for company in comparative query");
                missing_entities.push(entity.clone());
            }
        }

        info!(
            mode = "balanced",
            entity_count = entities.len(),
            quota,
            hit_count = hits.len(),
            missing = missing_entities.len(),
            "retrieval completed"
        );

        Ok(RetrievalResult { hits, mode: RetrievalMode::Balanced, missing_entities })
    }
}

/// Distinct company labels across loaded documents, in ingestion order.
pub(crate) fn known_companies(documents: &[Document]) -> Vec<String> {
    let mut companies = Vec::new();
    for document in documents {
        if !companies.iter().any(|c: &String| c.eq_ignore_ascii_case(&document.company)) {
            companies.push(document.company.clone());
        }
    }
    companies
}

/// The first metric keyword mentioned in the query, if any.
fn detect_metric(query: &str) -> Option<&'static str> {
    let query_lower = query.to_lowercase();
    METRIC_KEYWORDS.iter().copied().find(|metric| query_lower.contains(metric))
}
