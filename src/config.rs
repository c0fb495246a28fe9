//! Environment-driven configuration.
//!
//! All settings come from environment variables with sensible defaults; the
//! only hard requirement is `GROQ_API_KEY`. Missing or malformed required
//! values fail at startup, not on first use.

use std::env;
use std::fs;
use std::path::PathBuf;

use crate::errors::ApiError;
use crate::index::IndexKind;

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.45;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Groq API key, required at startup.
    pub groq_api_key: String,
    /// OpenAI-compatible base URL for chat completions.
    pub llm_base_url: String,
    pub llm_model: String,
    /// OpenAI-compatible base URL for the embedding server.
    pub embedding_base_url: String,
    /// Optional key for the embedding server (local servers need none).
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    /// Minimum similarity score for a hit to count as retrieved.
    pub similarity_threshold: f32,
    pub index_kind: IndexKind,
    /// Timeout applied to every embedding and generation HTTP call.
    pub request_timeout_secs: u64,
    pub max_query_length: usize,
    pub max_results: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ApiError> {
        let groq_api_key = env::var("GROQ_API_KEY")
            .map_err(|_| ApiError::Config("GROQ_API_KEY not set".to_string()))?;
        if groq_api_key.trim().is_empty() {
            return Err(ApiError::Config("GROQ_API_KEY is empty".to_string()));
        }

        let index_kind = match env_or("LEGALRAG_INDEX_KIND", "flat").as_str() {
            "flat" => IndexKind::Flat,
            "ivf" => IndexKind::Ivf,
            other => {
                return Err(ApiError::Config(format!(
                    "Unknown LEGALRAG_INDEX_KIND: {other} (expected \"flat\" or \"ivf\")"
                )))
            }
        };

        Ok(Self {
            groq_api_key,
            llm_base_url: env_or("LEGALRAG_LLM_BASE_URL", "https://api.groq.com/openai"),
            llm_model: env_or("LEGALRAG_LLM_MODEL", "llama-3.3-70b-versatile"),
            embedding_base_url: env_or("LEGALRAG_EMBEDDING_BASE_URL", "http://127.0.0.1:8080"),
            embedding_api_key: env::var("LEGALRAG_EMBEDDING_API_KEY").ok(),
            embedding_model: env_or("LEGALRAG_EMBEDDING_MODEL", "BAAI/bge-large-en-v1.5"),
            embedding_dimension: parse_or(
                "LEGALRAG_EMBEDDING_DIMENSION",
                DEFAULT_EMBEDDING_DIMENSION,
            )?,
            similarity_threshold: parse_or(
                "LEGALRAG_SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
            index_kind,
            request_timeout_secs: parse_or("LEGALRAG_REQUEST_TIMEOUT_SECS", 60)?,
            max_query_length: parse_or("LEGALRAG_MAX_QUERY_LENGTH", 1000)?,
            max_results: parse_or("LEGALRAG_MAX_RESULTS", 10)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ApiError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ApiError::Config(format!("Invalid value for {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Filesystem layout for corpus data, the persisted index, and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    /// Persisted index artifacts (vector block, doc ids, metadata).
    pub index_dir: PathBuf,
    /// Raw judgment documents, one JSON file per doc id.
    pub raw_docs_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::with_data_dir(discover_data_dir())
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let index_dir = data_dir.join("processed");
        let raw_docs_dir = data_dir.join("raw");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &index_dir, &raw_docs_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            index_dir,
            raw_docs_dir,
            log_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("LEGALRAG_DATA_DIR") {
        return PathBuf::from(dir);
    }

    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_paths_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(tmp.path().join("data"));

        assert!(paths.index_dir.is_dir());
        assert!(paths.raw_docs_dir.is_dir());
        assert!(paths.log_dir.is_dir());
    }
}
