//! Shared data model for the retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Metadata carried alongside every indexed judgment.
///
/// The serialized field names match the corpus metadata files, which use
/// `casenumber` as a single word.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "casenumber", default)]
    pub case_number: String,
    /// Size of the raw judgment document in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A single ranked search result. Produced per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub doc_id: String,
    /// Inner product of unit vectors, practically in [0, 1] for text.
    pub score: f32,
    pub metadata: CaseMetadata,
}

/// Verifiable reference to a retrieved judgment, returned with the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub court: String,
    pub date: String,
    pub case_number: String,
    pub relevance_score: f32,
    pub doc_id: String,
}

impl Citation {
    pub fn from_hit(hit: &RetrievalHit) -> Self {
        Citation {
            title: hit.metadata.title.clone(),
            court: hit.metadata.court.clone(),
            date: hit.metadata.date.clone(),
            case_number: hit.metadata.case_number.clone(),
            relevance_score: (hit.score * 1000.0).round() / 1000.0,
            doc_id: hit.doc_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Error,
}

/// The complete response to one `ask` invocation. Always well-formed, even
/// when generation failed.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub query: String,
    pub answer: String,
    pub confidence: Confidence,
    /// Ordered exactly like the hits the context was built from.
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Underlying failure text, kept for diagnostics rather than display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub retrieved_cases: usize,
}
