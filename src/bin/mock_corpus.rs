//! Writes a synthetic judgment corpus into the raw docs directory.
//!
//! Usage: `mock_corpus [count]` (default 20). Runs with a fixed seed, so
//! repeated invocations produce the same files.

use anyhow::Context;

use legalrag_backend::config::AppPaths;
use legalrag_backend::ingest::mock;
use legalrag_backend::logging;

const DEFAULT_COUNT: usize = 20;
const SEED: u64 = 42;

fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let count = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()
        .context("count must be a non-negative integer")?
        .unwrap_or(DEFAULT_COUNT);

    let doc_ids = mock::generate_corpus(&paths.raw_docs_dir, count, SEED)
        .context("Failed to write mock corpus")?;
    tracing::info!(
        count = doc_ids.len(),
        dir = %paths.raw_docs_dir.display(),
        "Mock corpus ready"
    );

    Ok(())
}
