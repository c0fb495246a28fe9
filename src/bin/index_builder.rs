//! Builds the vector index from the raw judgment corpus and persists it.
//!
//! Usage: `index_builder` with the same environment as the server. Reads
//! every `*.json` under the raw docs directory, embeds in batches, and
//! writes the index artifacts to the processed directory.

use std::sync::Arc;

use anyhow::Context;

use legalrag_backend::config::{AppPaths, Settings};
use legalrag_backend::ingest;
use legalrag_backend::llm::OpenAiCompatProvider;
use legalrag_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env().context("Failed to load settings")?;

    let embedder = Arc::new(OpenAiCompatProvider::new(
        "embeddings",
        &settings.embedding_base_url,
        settings.embedding_api_key.clone(),
        settings.request_timeout_secs,
    )?);

    tracing::info!(
        raw_dir = %paths.raw_docs_dir.display(),
        model = %settings.embedding_model,
        "Building index"
    );
    let index = ingest::build_corpus_index(&paths.raw_docs_dir, embedder, &settings)
        .await
        .context("Failed to build index from corpus")?;

    index
        .save(&paths.index_dir)
        .context("Failed to persist index")?;
    tracing::info!(
        documents = index.len(),
        dir = %paths.index_dir.display(),
        "Index saved"
    );

    Ok(())
}
