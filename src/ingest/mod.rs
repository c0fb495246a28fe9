//! Corpus ingestion: raw judgment files to a built, persisted index.
//!
//! Raw documents are `{doc_id}.json` files carrying title/court/date/case
//! number/bench plus the judgment body (often HTML) under `doc`. Ingestion
//! prepares one embedding text per document, batch-embeds, and builds the
//! vector index.

pub mod mock;

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::index::VectorIndex;
use crate::llm::LlmProvider;
use crate::rag::types::CaseMetadata;

const EMBED_BATCH_SIZE: usize = 32;

/// A raw judgment document as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJudgment {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "casenumber", default)]
    pub case_number: String,
    #[serde(default)]
    pub bench: Vec<String>,
    #[serde(default)]
    pub doc: String,
}

impl RawJudgment {
    pub fn metadata(&self, size: u64) -> CaseMetadata {
        CaseMetadata {
            title: self.title.clone(),
            court: self.court.clone(),
            date: self.date.clone(),
            case_number: self.case_number.clone(),
            size,
        }
    }
}

/// Combines metadata fields with the tag-stripped judgment body into the
/// text that gets embedded.
pub fn prepare_embedding_text(judgment: &RawJudgment) -> String {
    let mut parts = Vec::new();

    if !judgment.title.is_empty() {
        parts.push(format!("Title: {}", judgment.title));
    }
    if !judgment.court.is_empty() {
        parts.push(format!("Court: {}", judgment.court));
    }
    if !judgment.date.is_empty() {
        parts.push(format!("Date: {}", judgment.date));
    }
    if !judgment.case_number.is_empty() {
        parts.push(format!("Case Number: {}", judgment.case_number));
    }
    if !judgment.bench.is_empty() {
        parts.push(format!("Bench: {}", judgment.bench.join(", ")));
    }
    if !judgment.doc.is_empty() {
        parts.push(strip_html_tags(&judgment.doc));
    }

    parts.join("\n")
}

/// Reads every `*.json` under `raw_dir`, embeds the prepared texts in
/// batches, and builds a fresh index. Unreadable files are skipped with a
/// warning; an empty corpus is an error.
pub async fn build_corpus_index(
    raw_dir: &Path,
    embedder: Arc<dyn LlmProvider>,
    settings: &Settings,
) -> Result<VectorIndex, ApiError> {
    let mut doc_ids = Vec::new();
    let mut texts = Vec::new();
    let mut metadata = Vec::new();

    let mut entries: Vec<_> = std::fs::read_dir(raw_dir)
        .map_err(ApiError::internal)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Skipping unreadable file {}: {}", path.display(), err);
                continue;
            }
        };
        let judgment: RawJudgment = match serde_json::from_str(&raw) {
            Ok(judgment) => judgment,
            Err(err) => {
                tracing::warn!("Skipping malformed file {}: {}", path.display(), err);
                continue;
            }
        };
        let Some(doc_id) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string())
        else {
            continue;
        };

        metadata.push(judgment.metadata(raw.len() as u64));
        texts.push(prepare_embedding_text(&judgment));
        doc_ids.push(doc_id);
    }

    if doc_ids.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No judgment documents found under {}",
            raw_dir.display()
        )));
    }

    tracing::info!(documents = doc_ids.len(), "Embedding corpus");
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let embedded = embedder.embed(batch, &settings.embedding_model).await?;
        vectors.extend(embedded);
    }

    let mut index = VectorIndex::new(settings.embedding_dimension, settings.index_kind);
    index.build(vectors, doc_ids, metadata)?;
    Ok(index)
}

/// Drops markup from an HTML judgment body, script and style blocks
/// included, and collapses the leftover whitespace.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    let lower = html.to_lowercase();
    let chars: Vec<char> = html.chars().collect();
    let chars_lower: Vec<char> = lower.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        if !in_script && starts_with_at(&chars_lower, i, "<script") {
            in_script = true;
        }
        if !in_style && starts_with_at(&chars_lower, i, "<style") {
            in_style = true;
        }
        if in_script && starts_with_at(&chars_lower, i, "</script>") {
            in_script = false;
            i += "</script>".len();
            continue;
        }
        if in_style && starts_with_at(&chars_lower, i, "</style>") {
            in_style = false;
            i += "</style>".len();
            continue;
        }
        if in_script || in_style {
            i += 1;
            continue;
        }

        match chars[i] {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => result.push(c),
            _ => {}
        }
        i += 1;
    }

    result
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

fn starts_with_at(haystack: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    haystack.len() >= at + needle.len() && haystack[at..at + needle.len()] == needle[..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_scripts_and_styles() {
        let html = r#"
            <html>
            <head><script>var x = 1;</script><style>.a { color: red; }</style></head>
            <body><h1>Kesavananda</h1><p>Basic structure doctrine</p></body>
            </html>
        "#;

        let text = strip_html_tags(html);
        assert!(text.contains("Kesavananda"));
        assert!(text.contains("Basic structure doctrine"));
        assert!(!text.contains('<'));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn embedding_text_combines_fields_in_order() {
        let judgment = RawJudgment {
            title: "A vs B".to_string(),
            court: "Supreme Court of India".to_string(),
            date: "2018-03-09".to_string(),
            case_number: "42/2018".to_string(),
            bench: vec!["Justice X".to_string(), "Justice Y".to_string()],
            doc: "<p>The appeal is allowed.</p>".to_string(),
        };

        let text = prepare_embedding_text(&judgment);
        assert_eq!(
            text,
            "Title: A vs B\nCourt: Supreme Court of India\nDate: 2018-03-09\n\
             Case Number: 42/2018\nBench: Justice X, Justice Y\nThe appeal is allowed."
        );
    }

    #[test]
    fn empty_fields_are_omitted() {
        let judgment = RawJudgment {
            title: "A vs B".to_string(),
            court: String::new(),
            date: String::new(),
            case_number: String::new(),
            bench: Vec::new(),
            doc: String::new(),
        };
        assert_eq!(prepare_embedding_text(&judgment), "Title: A vs B");
    }
}
