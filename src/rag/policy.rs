//! Confidence-tiered answer policy.
//!
//! The generation strategy is a pure function of the hit count and the top
//! retrieval score. Zero hits short-circuits without a model call; a weak
//! top score gets a hedged general-knowledge prompt; a strong top score
//! gets the structured per-case prompt. Any generation failure collapses to
//! a well-formed error response, never a raw error to the caller.

use std::sync::Arc;

use crate::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

use super::context::ContextBuilder;
use super::retriever::Retriever;
use super::types::{AnswerResponse, Citation, Confidence, RetrievalHit};

/// Below this top score the hedged low-confidence prompt is used.
pub const LOW_CONFIDENCE_CUTOFF: f32 = 0.55;
/// Above this top score the final label is "high" rather than "medium".
pub const HIGH_CONFIDENCE_CUTOFF: f32 = 0.65;

const NO_MATCH_ANSWER: &str = "I couldn't find relevant case law in my database for your \
    question. However, I can provide general information: Please note this is general \
    knowledge, not based on specific case precedents. For authoritative answers, consult \
    indiankanoon.org or a legal professional.";
const NO_MATCH_SUGGESTION: &str =
    "Try rephrasing your question or search on indiankanoon.org";
const LOW_CONFIDENCE_WARNING: &str = "Limited case law matches. This response uses general \
    legal knowledge. Consult a lawyer for specific advice.";
const LOW_TIER_ERROR_ANSWER: &str = "I found limited relevant cases and encountered an \
    error. Please rephrase your question.";
const HIGH_TIER_ERROR_ANSWER: &str = "I encountered an error while processing your \
    question. Please try again.";

const LOW_CONFIDENCE_SYSTEM_PROMPT: &str = "\
You are a legal AI assistant. You have limited matching cases for this query.
Provide a general answer based on your knowledge of Indian law, but CLEARLY state:
1. That you don't have strong case law matches
2. This is general information only
3. User should consult a lawyer or indiankanoon.org

Keep it brief and helpful.";

const HIGH_CONFIDENCE_SYSTEM_PROMPT: &str = "\
You are a legal AI assistant specializing in Indian law.

ANSWER STRUCTURE (FOLLOW EXACTLY):

1. GENERAL ANSWER FIRST (2-3 sentences):
   - Start with the general legal principle about this topic in Indian law
   - Use your knowledge of Indian law to give a helpful overview

2. CASE-BY-CASE ANALYSIS:
   - For EACH retrieved case, explain:
     * How it relates to the question
     * What legal principle or ruling it establishes
     * Key relevant points from the judgment

3. CONFIDENCE ASSESSMENT:
   - State whether the cases strongly support your answer or are tangentially related

CRITICAL RULES:
- Start with general answer, then discuss cases in the order given
- Analyze each case individually - explain its relevance
- Never say cases \"don't answer\" if they're related - explain how they relate
- Be specific about what each case says
- Ground your general answer in the case law when possible";

/// Generation strategy, selected from the top hit score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    NoMatch,
    LowConfidence,
    HighConfidence,
}

impl ConfidenceTier {
    /// Pure tier selection. The 0.55 boundary is inclusive: a top score of
    /// exactly 0.55 picks the high-confidence prompt.
    pub fn select(top_score: Option<f32>) -> Self {
        match top_score {
            None => ConfidenceTier::NoMatch,
            Some(score) if score < LOW_CONFIDENCE_CUTOFF => ConfidenceTier::LowConfidence,
            Some(_) => ConfidenceTier::HighConfidence,
        }
    }

    /// Final confidence label, re-derived from the same score. The high
    /// tier never labels "low": exactly 0.55 labels "medium" even though it
    /// sits on the tier boundary.
    pub fn label(self, top_score: f32) -> Confidence {
        match self {
            ConfidenceTier::NoMatch | ConfidenceTier::LowConfidence => Confidence::Low,
            ConfidenceTier::HighConfidence => {
                if top_score > HIGH_CONFIDENCE_CUTOFF {
                    Confidence::High
                } else {
                    Confidence::Medium
                }
            }
        }
    }
}

/// The full ask pipeline: retrieval, context assembly, tiered generation,
/// and response packaging. One instance serves all queries concurrently;
/// it holds only read-only handles.
pub struct RagService {
    retriever: Retriever,
    context: ContextBuilder,
    generator: Arc<dyn LlmProvider>,
    llm_model: String,
}

impl RagService {
    pub fn new(
        retriever: Retriever,
        context: ContextBuilder,
        generator: Arc<dyn LlmProvider>,
        llm_model: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            context,
            generator,
            llm_model: llm_model.into(),
        }
    }

    /// Ranked retrieval without generation.
    pub async fn retrieve_documents(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalHit>, ApiError> {
        self.retriever.retrieve(query, top_k).await
    }

    /// Main entry point. Always returns a well-formed response; retrieval
    /// and generation failures surface as the error tier.
    pub async fn ask(&self, query: &str, top_k: usize) -> AnswerResponse {
        let hits = match self.retriever.retrieve(query, top_k).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::error!("Retrieval failed for query: {}", err);
                return self.error_response(query, err.to_string(), HIGH_TIER_ERROR_ANSWER);
            }
        };

        let top_score = hits.first().map(|hit| hit.score);
        let tier = ConfidenceTier::select(top_score);
        tracing::info!(
            retrieved = hits.len(),
            top_score = top_score.unwrap_or(0.0),
            tier = ?tier,
            "Processing query"
        );

        match tier {
            ConfidenceTier::NoMatch => AnswerResponse {
                query: query.to_string(),
                answer: NO_MATCH_ANSWER.to_string(),
                confidence: Confidence::Low,
                citations: Vec::new(),
                warning: None,
                suggestion: Some(NO_MATCH_SUGGESTION.to_string()),
                error: None,
                model: None,
                retrieved_cases: 0,
            },
            ConfidenceTier::LowConfidence => self.answer_low_confidence(query, &hits).await,
            ConfidenceTier::HighConfidence => {
                self.answer_high_confidence(query, &hits, tier).await
            }
        }
    }

    async fn answer_low_confidence(
        &self,
        query: &str,
        hits: &[RetrievalHit],
    ) -> AnswerResponse {
        let context = self.context.build(hits).await;

        let user_prompt = format!(
            "Question: {query}\n\n\
             Limited case matches found:\n{context}\n\n\
             Provide a brief, general answer about this legal topic in Indian law, but \
             clearly state this is general information and not based on strong case \
             precedents. Recommend consulting a lawyer."
        );
        let request = ChatRequest::new(vec![
            ChatMessage::system(LOW_CONFIDENCE_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .temperature(0.5)
        .max_tokens(500);

        match self.generator.chat(request, &self.llm_model).await {
            Ok(answer) => AnswerResponse {
                query: query.to_string(),
                answer,
                confidence: Confidence::Low,
                // Citations reflect what was retrieved, not what the hedged
                // answer relied on.
                citations: hits.iter().map(Citation::from_hit).collect(),
                warning: Some(LOW_CONFIDENCE_WARNING.to_string()),
                suggestion: None,
                error: None,
                model: Some(self.llm_model.clone()),
                retrieved_cases: hits.len(),
            },
            Err(err) => {
                tracing::error!("Generation failed in low-confidence tier: {}", err);
                self.error_response(query, err.to_string(), LOW_TIER_ERROR_ANSWER)
            }
        }
    }

    async fn answer_high_confidence(
        &self,
        query: &str,
        hits: &[RetrievalHit],
        tier: ConfidenceTier,
    ) -> AnswerResponse {
        let context = self.context.build(hits).await;

        let user_prompt = format!(
            "Question: {query}\n\n\
             Below are relevant Supreme Court judgments with excerpts:\n\n{context}\n\n\
             Instructions:\n\
             1. First, provide a general answer about this topic in Indian law (2-3 sentences)\n\
             2. Then analyze EACH case above individually:\n\
                - Explain how it relates to the question\n\
                - State what it says about the issue\n\
                - Highlight key relevant points\n\
             3. End with a brief confidence statement about how well the cases address the question\n\n\
             Remember: Even if cases are tangentially related, explain HOW they relate. \
             Don't dismiss them.\n\n\
             Answer:"
        );
        let request = ChatRequest::new(vec![
            ChatMessage::system(HIGH_CONFIDENCE_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .temperature(0.3)
        .top_p(0.9)
        .max_tokens(1000);

        match self.generator.chat(request, &self.llm_model).await {
            Ok(answer) => {
                let top_score = hits[0].score;
                AnswerResponse {
                    query: query.to_string(),
                    answer,
                    confidence: tier.label(top_score),
                    citations: hits.iter().map(Citation::from_hit).collect(),
                    warning: None,
                    suggestion: None,
                    error: None,
                    model: Some(self.llm_model.clone()),
                    retrieved_cases: hits.len(),
                }
            }
            Err(err) => {
                tracing::error!("Generation failed in high-confidence tier: {}", err);
                self.error_response(query, err.to_string(), HIGH_TIER_ERROR_ANSWER)
            }
        }
    }

    fn error_response(&self, query: &str, error: String, answer: &str) -> AnswerResponse {
        AnswerResponse {
            query: query.to_string(),
            answer: answer.to_string(),
            confidence: Confidence::Error,
            citations: Vec::new(),
            warning: None,
            suggestion: None,
            error: Some(error),
            model: None,
            retrieved_cases: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::index::test_support::meta;
    use crate::index::{IndexKind, VectorIndex};
    use crate::rag::context::DocumentStore;
    use crate::rag::types::CaseMetadata;

    #[test]
    fn tier_selection_boundaries() {
        assert_eq!(ConfidenceTier::select(None), ConfidenceTier::NoMatch);
        assert_eq!(
            ConfidenceTier::select(Some(0.5499)),
            ConfidenceTier::LowConfidence
        );
        assert_eq!(
            ConfidenceTier::select(Some(0.55)),
            ConfidenceTier::HighConfidence
        );
        assert_eq!(
            ConfidenceTier::select(Some(0.9)),
            ConfidenceTier::HighConfidence
        );
    }

    #[test]
    fn exact_boundary_score_labels_medium() {
        // 0.55 picks the high-confidence prompt but labels "medium".
        let tier = ConfidenceTier::select(Some(0.55));
        assert_eq!(tier, ConfidenceTier::HighConfidence);
        assert_eq!(tier.label(0.55), Confidence::Medium);
    }

    #[test]
    fn labels_follow_the_score_not_the_tier_boundary() {
        assert_eq!(
            ConfidenceTier::LowConfidence.label(0.5499),
            Confidence::Low
        );
        assert_eq!(
            ConfidenceTier::HighConfidence.label(0.60),
            Confidence::Medium
        );
        assert_eq!(
            ConfidenceTier::HighConfidence.label(0.65),
            Confidence::Medium
        );
        assert_eq!(
            ConfidenceTier::HighConfidence.label(0.6500001),
            Confidence::High
        );
    }

    /// Generator stub counting chat calls; embeddings are canned.
    struct StubProvider {
        embedding: Vec<f32>,
        chat_reply: Result<String, String>,
        chat_calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(embedding: Vec<f32>, chat_reply: Result<String, String>) -> Arc<Self> {
            Arc::new(Self {
                embedding,
                chat_reply,
                chat_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, _request: ChatRequest, _model: &str) -> Result<String, ApiError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.chat_reply
                .clone()
                .map_err(ApiError::Generation)
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(vec![self.embedding.clone(); inputs.len()])
        }
    }

    struct MapStore(HashMap<String, String>);

    #[async_trait]
    impl DocumentStore for MapStore {
        async fn load_full_text(&self, doc_id: &str) -> Result<Option<String>, ApiError> {
            Ok(self.0.get(doc_id).cloned())
        }
    }

    /// Three-document index over orthogonal axes of a 4-dim space; the
    /// fourth axis has no document, so a query embedding's first three
    /// components choose the scores directly (stored vectors are basis
    /// vectors) while the fourth absorbs the rest of the unit norm.
    fn service(provider: Arc<StubProvider>, threshold: f32) -> RagService {
        let mut index = VectorIndex::new(4, IndexKind::Flat);
        let mut metas: Vec<CaseMetadata> = Vec::new();
        for i in 0..3 {
            let mut m = meta(&format!("Case {i}"));
            m.case_number = format!("{i}00/2021");
            metas.push(m);
        }
        index
            .build(
                vec![
                    vec![1.0, 0.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0, 0.0],
                    vec![0.0, 0.0, 1.0, 0.0],
                ],
                vec!["d0".to_string(), "d1".to_string(), "d2".to_string()],
                metas,
            )
            .unwrap();
        let index = Arc::new(index);

        let docs: HashMap<String, String> = [
            ("d0", "judgment zero"),
            ("d1", "judgment one"),
            ("d2", "judgment two"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let retriever = Retriever::new(index, provider.clone(), "embed-model", threshold);
        let context = ContextBuilder::new(Arc::new(MapStore(docs)));
        RagService::new(retriever, context, provider, "test-llm")
    }

    #[tokio::test]
    async fn no_match_answers_without_calling_the_generator() {
        // Unit query scoring 0.5 on every axis, below the 0.9 threshold.
        let provider = StubProvider::new(
            vec![0.5, 0.5, 0.5, 0.5],
            Ok("should never be used".to_string()),
        );
        let svc = service(provider.clone(), 0.9);

        let response = svc.ask("novel question", 3).await;

        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(response.confidence, Confidence::Low);
        assert!(response.citations.is_empty());
        assert!(response.suggestion.is_some());
        assert_eq!(response.retrieved_cases, 0);
    }

    #[tokio::test]
    async fn strong_match_returns_high_confidence_with_ordered_citations() {
        // Scores after normalization: 0.800 / 0.509 / 0.318.
        let provider = StubProvider::new(
            vec![0.8, 0.509, 0.318, 0.0],
            Ok("General principle. Case analyses. Confidence statement.".to_string()),
        );
        let svc = service(provider.clone(), 0.3);

        let response = svc.ask("grounds for eviction", 3).await;

        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.confidence, Confidence::High);
        assert_eq!(response.retrieved_cases, 3);
        assert_eq!(response.citations.len(), 3);
        let cited: Vec<&str> = response
            .citations
            .iter()
            .map(|c| c.doc_id.as_str())
            .collect();
        assert_eq!(cited, vec!["d0", "d1", "d2"]);
        assert_eq!(response.model.as_deref(), Some("test-llm"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn weak_match_carries_warning_and_all_citations() {
        // Near-unit query: top score ~0.50, low-confidence tier but above
        // the 0.45 threshold; the other two axes fall below it.
        let provider = StubProvider::new(
            vec![0.5, 0.3, 0.1, 0.806],
            Ok("Hedged general answer.".to_string()),
        );
        let svc = service(provider.clone(), 0.45);

        let response = svc.ask("obscure question", 3).await;

        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.confidence, Confidence::Low);
        assert!(response.warning.is_some());
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].doc_id, "d0");
    }

    #[tokio::test]
    async fn generation_failure_becomes_error_tier() {
        let provider = StubProvider::new(
            vec![1.0, 0.0, 0.0, 0.0],
            Err("quota exceeded".to_string()),
        );
        let svc = service(provider.clone(), 0.3);

        let response = svc.ask("any question", 3).await;

        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.confidence, Confidence::Error);
        assert!(response.citations.is_empty());
        let error = response.error.unwrap();
        assert!(error.contains("quota exceeded"));
        // The apology shown to the user does not leak the raw error.
        assert!(!response.answer.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn citation_scores_are_rounded() {
        let provider = StubProvider::new(vec![1.0, 0.0, 0.0, 0.0], Ok("answer".to_string()));
        let svc = service(provider, 0.3);

        let response = svc.ask("q", 1).await;
        let score = response.citations[0].relevance_score;
        assert!((score * 1000.0).fract().abs() < 1e-3);
    }
}
