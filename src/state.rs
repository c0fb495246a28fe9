use std::sync::Arc;

use crate::config::{AppPaths, Settings};
use crate::errors::ApiError;
use crate::index::VectorIndex;
use crate::llm::{LlmProvider, OpenAiCompatProvider};
use crate::rag::context::{ContextBuilder, FsDocumentStore};
use crate::rag::policy::RagService;
use crate::rag::retriever::Retriever;

/// Global application state shared across all routes.
///
/// Everything here is read-only after startup: the index is loaded once and
/// never mutated, so handlers can share it without locking.
pub struct AppState {
    pub settings: Settings,
    pub paths: Arc<AppPaths>,
    pub index: Arc<VectorIndex>,
    pub rag: RagService,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// Fails fast on missing credentials, a missing or inconsistent index,
    /// or an index whose dimension disagrees with the configured embedding
    /// model. The server should not come up in any of those states.
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let settings = Settings::from_env()?;
        let paths = Arc::new(AppPaths::new());

        let index = VectorIndex::load(&paths.index_dir, settings.index_kind)?;
        if index.dimension() != settings.embedding_dimension {
            return Err(ApiError::Config(format!(
                "Loaded index has dimension {} but LEGALRAG_EMBEDDING_DIMENSION is {}",
                index.dimension(),
                settings.embedding_dimension
            )));
        }
        let index = Arc::new(index);

        let generator: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::new(
            "groq",
            &settings.llm_base_url,
            Some(settings.groq_api_key.clone()),
            settings.request_timeout_secs,
        )?);
        let embedder: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::new(
            "embeddings",
            &settings.embedding_base_url,
            settings.embedding_api_key.clone(),
            settings.request_timeout_secs,
        )?);

        let retriever = Retriever::new(
            index.clone(),
            embedder,
            settings.embedding_model.clone(),
            settings.similarity_threshold,
        );
        let context = ContextBuilder::new(Arc::new(FsDocumentStore::new(
            paths.raw_docs_dir.clone(),
        )));
        let rag = RagService::new(retriever, context, generator, settings.llm_model.clone());

        Ok(Arc::new(AppState {
            settings,
            paths,
            index,
            rag,
        }))
    }
}
