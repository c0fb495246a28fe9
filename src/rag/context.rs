//! Context assembly from retrieved judgments.
//!
//! Each hit contributes one labeled block, in rank order, with the judgment
//! text truncated to a fixed character budget. The generation prompt tells
//! the model to discuss cases in the order given, so block order must match
//! citation order in the final response.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ApiError;

use super::types::RetrievalHit;

/// Character budget per judgment excerpt.
pub const EXCERPT_CHAR_BUDGET: usize = 2000;
pub const TRUNCATION_MARKER: &str = "...";
pub const MISSING_DOC_PLACEHOLDER: &str = "[Judgment text unavailable]";
pub const EMPTY_CONTEXT: &str = "No relevant case law found.";

/// Read-only source of full judgment texts, keyed by doc id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` means the document is not in the store; that is not an
    /// error at this layer.
    async fn load_full_text(&self, doc_id: &str) -> Result<Option<String>, ApiError>;
}

/// Document store over the raw corpus directory: one `{doc_id}.json` file
/// per judgment, with the body under the `doc` key.
pub struct FsDocumentStore {
    raw_dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(raw_dir: PathBuf) -> Self {
        Self { raw_dir }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load_full_text(&self, doc_id: &str) -> Result<Option<String>, ApiError> {
        let path = self.raw_dir.join(format!("{doc_id}.json"));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ApiError::internal(err)),
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("Malformed judgment file {}: {}", path.display(), err);
                return Ok(None);
            }
        };

        Ok(parsed
            .get("doc")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }
}

pub struct ContextBuilder {
    store: Arc<dyn DocumentStore>,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Builds the prompt context from ranked hits.
    ///
    /// A missing or unreadable judgment yields a placeholder block; it never
    /// aborts the build for the other hits.
    pub async fn build(&self, hits: &[RetrievalHit]) -> String {
        if hits.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }

        let mut blocks = Vec::with_capacity(hits.len());
        for (rank, hit) in hits.iter().enumerate() {
            let excerpt = match self.store.load_full_text(&hit.doc_id).await {
                Ok(Some(text)) => truncate_chars(&text, EXCERPT_CHAR_BUDGET),
                Ok(None) => MISSING_DOC_PLACEHOLDER.to_string(),
                Err(err) => {
                    tracing::warn!("Failed to load judgment {}: {}", hit.doc_id, err);
                    MISSING_DOC_PLACEHOLDER.to_string()
                }
            };

            blocks.push(format!(
                "===== CASE {rank_no} =====\n\
                 Title: {title}\n\
                 Court: {court}\n\
                 Date: {date}\n\
                 Case Number: {case_number}\n\
                 Relevance Score: {score:.3}\n\
                 \n\
                 Judgment Excerpt:\n\
                 {excerpt}\n\
                 \n\
                 ==================\n",
                rank_no = rank + 1,
                title = hit.metadata.title,
                court = hit.metadata.court,
                date = hit.metadata.date,
                case_number = hit.metadata.case_number,
                score = hit.score,
            ));
        }

        blocks.join("\n")
    }
}

fn truncate_chars(text: &str, budget: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(budget).collect();
    if chars.next().is_some() {
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        head
    }
}
