//! Provider abstractions for the unified LLM interface.

use crate::message::Message;
use crate::model::ModelInfo;
use crate::request::CompletionRequest;
use crate::response::CompletionResponse;
use crate::stream::CompletionStream;
use crate::Result;
use async_trait::async_trait;

/// A trait for LLM providers.
///
/// All LLM services (OpenAI, Anthropic, DeepSeek, local runtimes, and the
/// router itself) implement this interface. Providers are shared behind
/// `Arc<dyn Provider>` — a caller that captured a reference keeps the
/// provider alive even after it is unregistered from a router.
///
/// In-flight calls terminate promptly when the caller drops the future;
/// partial streamed output observed up to that point remains valid.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable short identifier (e.g. "openai", "anthropic").
    fn name(&self) -> &str;

    /// Execute a non-streaming completion request.
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse>;

    /// Execute a streaming completion request.
    async fn stream(&self, req: CompletionRequest) -> Result<CompletionStream>;

    /// Available models. Must be cheap — no I/O on the hot path; adapters
    /// cache their catalog.
    fn models(&self) -> Vec<ModelInfo>;

    /// Best-effort token count for the messages. Exactness is not required.
    fn count_tokens(&self, messages: &[Message]) -> Result<usize>;
}

/// A provider that also produces vector embeddings.
#[async_trait]
pub trait EmbeddingProvider: Provider {
    /// Embed the given texts. The output preserves input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
