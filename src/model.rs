//! Chat model trait for answer generation.

use async_trait::async_trait;

use crate::error::Result;

/// A synchronous-completion language model boundary.
///
/// Implementations wrap a chat-completion backend. The call is
/// request/response (no streaming), and implementations are expected to
/// retry transient failures internally before surfacing
/// [`RagError::AnswerGeneration`](crate::RagError::AnswerGeneration).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// The model identifier, for logging and error reporting.
    fn name(&self) -> &str;
}
