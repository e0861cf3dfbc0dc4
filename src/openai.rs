//! OpenAI adapters for embeddings and chat completion.
//!
//! This module is only available when the `openai` feature is enabled.
//! Both adapters call the HTTP API directly with `reqwest` and retry
//! transient failures (HTTP 408/429/5xx and transport errors) with the
//! crate's bounded exponential backoff before surfacing an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::model::ChatModel;
use crate::retry::{RetryPolicy, with_backoff};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default OpenAI chat completions API endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// The default chat model.
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for analysis answers.
const CHAT_TEMPERATURE: f32 = 0.1;

/// A failed HTTP call, classified for the retry loop.
#[derive(Debug)]
struct CallError {
    message: String,
    transient: bool,
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn transport_error(e: reqwest::Error) -> CallError {
    // Connection failures and timeouts are worth retrying; anything the
    // client rejects outright (bad request construction) is not.
    CallError { message: format!("request failed: {e}"), transient: e.is_timeout() || e.is_connect() }
}

async fn status_error(response: reqwest::Response) -> CallError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    let transient = status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error();
    CallError { message: format!("API returned {status}: {detail}"), transient }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-3-small`.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
/// - `retry_policy` – bounded exponential backoff for transient failures.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    retry_policy: RetryPolicy,
}

impl OpenAiEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`) and dimensions (1536).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EmbeddingService {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::EmbeddingService {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Set the retry policy for transient failures.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn request_embeddings(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, CallError> {
        let request_body =
            EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| CallError {
            message: format!("failed to parse response: {e}"),
            transient: false,
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingService {
            provider: "OpenAI".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        let embeddings = with_backoff(
            &self.retry_policy,
            "openai embeddings",
            |e: &CallError| e.transient,
            || self.request_embeddings(texts),
        )
        .await
        .map_err(|e| {
            error!(provider = "OpenAI", error = %e, "embedding request failed");
            RagError::EmbeddingService { provider: "OpenAI".into(), message: e.message }
        })?;

        // A partial batch is a whole-batch failure: inputs are never
        // silently dropped.
        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingService {
                provider: "OpenAI".into(),
                message: format!(
                    "API returned {} embeddings for {} inputs",
                    embeddings.len(),
                    texts.len()
                ),
            });
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat model ─────────────────────────────────────────────────────

/// A [`ChatModel`] backed by the OpenAI chat completions API.
///
/// Non-streaming: the full completion is returned in one response.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    retry_policy: RetryPolicy,
}

impl OpenAiChatModel {
    /// Create a new chat model with the given API key.
    ///
    /// Uses the default model (`gpt-4o-mini`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::AnswerGeneration {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_CHAT_MODEL.into(),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Create a new chat model using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::AnswerGeneration {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `gpt-4o`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the retry policy for transient failures.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn request_completion(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> std::result::Result<String, CallError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: CHAT_TEMPERATURE,
            max_tokens,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| CallError {
            message: format!("failed to parse response: {e}"),
            transient: false,
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CallError {
                message: "API returned no choices".into(),
                transient: false,
            })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(provider = "OpenAI", model = %self.model, prompt_len = prompt.len(), "requesting completion");

        with_backoff(
            &self.retry_policy,
            "openai chat completion",
            |e: &CallError| e.transient,
            || self.request_completion(prompt, max_tokens),
        )
        .await
        .map_err(|e| {
            error!(provider = "OpenAI", error = %e, "completion request failed");
            RagError::AnswerGeneration { provider: "OpenAI".into(), message: e.message }
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}
