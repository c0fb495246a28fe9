//! Query-to-hits retrieval: one embedding call, then a thresholded index
//! search. Zero hits is a normal outcome, not an error.

use std::sync::Arc;

use crate::errors::ApiError;
use crate::index::VectorIndex;
use crate::llm::LlmProvider;

use super::types::RetrievalHit;

pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: impl Into<String>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            index,
            embedder,
            embedding_model: embedding_model.into(),
            similarity_threshold,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Embeds the query and returns ranked hits above the similarity
    /// threshold. `top_k` is clamped to `1..=index.len()`, never rejected.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalHit>, ApiError> {
        let embeddings = self
            .embedder
            .embed(&[query.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
            ApiError::Internal("Embedding provider returned no vectors".to_string())
        })?;

        let k = top_k.max(1).min(self.index.len().max(1));
        self.index
            .search(&query_embedding, k, Some(self.similarity_threshold))
    }
}
