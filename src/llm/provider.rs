use async_trait::async_trait;

use super::types::ChatRequest;
use crate::errors::ApiError;

/// A model endpoint the pipeline treats as an opaque function.
///
/// One instance serves chat completions (the generator), another serves
/// embeddings; both speak the same OpenAI-compatible surface, so a single
/// trait covers them and tests can swap in counters and canned vectors.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs (e.g. "groq", "local-embeddings").
    fn name(&self) -> &str;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// Chat completion (non-streaming).
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// Generate one embedding per input string.
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
