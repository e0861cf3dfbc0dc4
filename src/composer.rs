//! Answer composition: prompt assembly, model invocation, citations.

use std::sync::Arc;

use tracing::info;

use crate::document::{Answer, Citation, RetrievalResult, ScoredChunk};
use crate::error::Result;
use crate::model::ChatModel;

/// Default completion budget for an analysis answer.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Instruction block prepended to every analysis prompt.
const ANALYST_INSTRUCTIONS: &str = "\
You are an expert financial analyst. Analyze the provided context from financial documents to answer the question thoroughly.

INSTRUCTIONS:
1. Use all relevant information from the context.
2. For comparative questions, provide details for each company mentioned.
3. Cite specific numbers and data points.
4. Structure comparative answers with clear sections for each company.
5. If data is missing, explicitly state what is missing.
6. Always attempt an answer based on the available context.";

/// Returned without invoking the model when retrieval produced no usable context.
const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the loaded documents for this question.";

/// Builds a bounded prompt from retrieved chunks, invokes the chat model,
/// and attaches source citations.
///
/// The composer holds no mutable state; its only side effect is the model
/// call itself.
pub struct AnswerComposer {
    model: Arc<dyn ChatModel>,
    max_context_chars: usize,
    max_tokens: u32,
}

impl AnswerComposer {
    /// Create a new composer.
    ///
    /// `max_context_chars` bounds the total chunk text included in a
    /// prompt; lowest-scored chunks are dropped first when the retrieval
    /// result exceeds it.
    pub fn new(model: Arc<dyn ChatModel>, max_context_chars: usize) -> Self {
        Self { model, max_context_chars, max_tokens: DEFAULT_MAX_TOKENS }
    }

    /// Set the completion token budget passed to the model.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Compose an answer for `question` from the retrieved context.
    ///
    /// When retrieval produced no chunks at all, a fixed no-context answer
    /// is returned without invoking the model. Companies flagged as missing
    /// by balanced retrieval are noted in the prompt so the model reports
    /// the gap instead of inventing data.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::AnswerGeneration`](crate::RagError::AnswerGeneration)
    /// if the model fails after retry exhaustion.
    pub async fn compose(&self, question: &str, retrieval: &RetrievalResult) -> Result<Answer> {
        if retrieval.hits.is_empty() {
            let text = if retrieval.missing_entities.is_empty() {
                NO_CONTEXT_ANSWER.to_string()
            } else {
                format!(
                    "{NO_CONTEXT_ANSWER} No excerpts were retrieved for: {}.",
                    retrieval.missing_entities.join(", ")
                )
            };
            return Ok(Answer { text, citations: Vec::new() });
        }

        let included = self.fit_to_budget(&retrieval.hits);
        let context = format_context(&included);

        let mut prompt = format!(
            "{ANALYST_INSTRUCTIONS}\n\nCONTEXT FROM FINANCIAL DOCUMENTS:\n{context}\n"
        );
        if !retrieval.missing_entities.is_empty() {
            prompt.push_str(&format!(
                "\nNOTE: no excerpts were retrieved for: {}. State this gap in the answer.\n",
                retrieval.missing_entities.join(", ")
            ));
        }
        prompt.push_str(&format!("\nQUESTION: {question}\n\nDETAILED ANALYSIS:"));

        let text = self.model.complete(&prompt, self.max_tokens).await?;

        let citations: Vec<Citation> = included
            .iter()
            .map(|hit| Citation {
                document_id: hit.chunk.document_id.clone(),
                company: hit.company.clone(),
                chunk_index: hit.chunk.chunk_index,
            })
            .collect();

        info!(
            model = self.model.name(),
            chunks_included = included.len(),
            chunks_dropped = retrieval.hits.len() - included.len(),
            "answer composed"
        );

        Ok(Answer { text, citations })
    }

    /// Select the chunks that fit the context budget, dropping the
    /// lowest-scored first and preserving the retrieval order of the rest.
    /// The top-scored chunk is always kept; if it alone exceeds the
    /// budget its text is truncated to fit.
    fn fit_to_budget(&self, hits: &[ScoredChunk]) -> Vec<ScoredChunk> {
        let char_len = |hit: &ScoredChunk| hit.chunk.text.chars().count();
        let mut total: usize = hits.iter().map(char_len).sum();

        let mut dropped = vec![false; hits.len()];
        let mut by_score: Vec<usize> = (0..hits.len()).collect();
        by_score.sort_by(|&a, &b| {
            hits[a].score.partial_cmp(&hits[b].score).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut remaining = hits.len();
        for &i in &by_score {
            if total <= self.max_context_chars || remaining == 1 {
                break;
            }
            dropped[i] = true;
            total -= char_len(&hits[i]);
            remaining -= 1;
        }

        let mut included: Vec<ScoredChunk> = hits
            .iter()
            .zip(&dropped)
            .filter(|(_, dropped)| !**dropped)
            .map(|(hit, _)| hit.clone())
            .collect();

        if included.len() == 1 && char_len(&included[0]) > self.max_context_chars {
            let truncated: String =
                included[0].chunk.text.chars().take(self.max_context_chars).collect();
            included[0].chunk.text = truncated;
        }

        included
    }
}

/// Format chunks as tagged context blocks, one per chunk.
fn format_context(hits: &[ScoredChunk]) -> String {
    let blocks: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let doc_type = hit
                .chunk
                .metadata
                .get("doc_type")
                .map(String::as_str)
                .unwrap_or("Document");
            format!(
                "[Document {} - {} - {}]:\n{}",
                i + 1,
                hit.company,
                doc_type,
                hit.chunk.text
            )
        })
        .collect();
    blocks.join("\n---\n")
}
