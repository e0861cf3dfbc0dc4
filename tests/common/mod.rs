//! Shared fixtures: deterministic embedding and chat model stand-ins.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use finrag::{ChatModel, Chunk, Document, EmbeddingProvider, IndexEntry, RagError};

/// Deterministic bag-of-words embedder over a fixed vocabulary.
///
/// Component `i` counts occurrences of `vocab[i]` in the lowercased text;
/// the vector is L2-normalized when non-zero. Identical text always embeds
/// identically, and texts sharing vocabulary score high cosine similarity.
pub struct VocabEmbedder {
    vocab: Vec<&'static str>,
}

impl VocabEmbedder {
    pub fn new(vocab: &[&'static str]) -> Self {
        Self { vocab: vocab.to_vec() }
    }

    pub fn financial() -> Self {
        Self::new(&["tesla", "apple", "nvidia", "microsoft", "revenue", "risk", "battery"])
    }
}

#[async_trait]
impl EmbeddingProvider for VocabEmbedder {
    async fn embed(&self, text: &str) -> finrag::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> =
            self.vocab.iter().map(|w| lower.matches(w).count() as f32).collect();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.vocab.len()
    }
}

/// Chat model returning a fixed answer and recording every prompt.
pub struct StaticChatModel {
    answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl StaticChatModel {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ChatModel for StaticChatModel {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> finrag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "static-test-model"
    }
}

/// Chat model that fails every call. Used to prove a path never invokes
/// the model.
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> finrag::Result<String> {
        Err(RagError::AnswerGeneration {
            provider: "failing-test-model".to_string(),
            message: "unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing-test-model"
    }
}

/// A document fixture with stable metadata.
pub fn make_document(id: &str, company: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        filename: format!("{company}.txt"),
        company: company.to_string(),
        doc_type: "10-K".to_string(),
        raw_text: text.to_string(),
        page_count: 1,
        content_hash: 0,
        ingested_at: Utc::now(),
    }
}

/// An index entry fixture tied to a document.
pub fn make_entry(document: &Document, chunk_index: usize, text: &str, embedding: Vec<f32>) -> IndexEntry {
    let mut metadata = HashMap::new();
    metadata.insert("company".to_string(), document.company.clone());
    metadata.insert("doc_type".to_string(), document.doc_type.clone());
    metadata.insert("source".to_string(), document.filename.clone());
    metadata.insert("chunk_index".to_string(), chunk_index.to_string());

    IndexEntry {
        chunk: Chunk {
            id: format!("{}_{chunk_index}", document.id),
            text: text.to_string(),
            document_id: document.id.clone(),
            chunk_index,
            char_offset: 0,
            metadata,
        },
        embedding,
    }
}

/// Unit vector along axis `i` of an `dim`-dimensional space.
pub fn axis(dim: usize, i: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[i] = 1.0;
    v
}
