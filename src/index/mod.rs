//! In-process vector index for semantic search over judgment embeddings.
//!
//! Vectors are unit-normalized at build time so the inner product of a
//! normalized query against the stored block equals cosine similarity.
//! The scan strategy (exact flat scan vs. IVF-style clustered scan) sits
//! behind [`SearchBackend`]; the flat backend is the reference that tests
//! and correctness arguments run against.

mod flat;
mod ivf;
mod persist;

pub use flat::FlatBackend;
pub use ivf::IvfBackend;

use serde::Serialize;

use crate::errors::ApiError;
use crate::rag::types::{CaseMetadata, RetrievalHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Exact linear scan. Fine up to roughly 10^5 documents.
    Flat,
    /// Approximate clustered scan for larger corpora.
    Ivf,
}

impl IndexKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Flat => "flat",
            IndexKind::Ivf => "ivf",
        }
    }
}

/// Scan strategy over the normalized vector block.
///
/// Returns `(insertion index, score)` pairs sorted by descending score, at
/// most `k` of them. Ties must preserve insertion order.
pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> IndexKind;
    fn search(&self, vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)>;
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub dimension: usize,
    pub index_type: &'static str,
}

/// Owner of the vector block and its parallel doc-id and metadata lists.
///
/// Invariant: `vectors.len() == doc_ids.len() == metadata.len()`. The set is
/// replaced wholesale by `build`/`load`; there are no partial updates, so
/// once built the index is safe for unbounded concurrent readers.
pub struct VectorIndex {
    dimension: usize,
    kind: IndexKind,
    vectors: Vec<Vec<f32>>,
    doc_ids: Vec<String>,
    metadata: Vec<CaseMetadata>,
    backend: Option<Box<dyn SearchBackend>>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("dimension", &self.dimension)
            .field("kind", &self.kind)
            .field("len", &self.vectors.len())
            .finish_non_exhaustive()
    }
}

impl VectorIndex {
    pub fn new(dimension: usize, kind: IndexKind) -> Self {
        VectorIndex {
            dimension,
            kind,
            vectors: Vec::new(),
            doc_ids: Vec::new(),
            metadata: Vec::new(),
            backend: None,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.doc_ids.len(),
            dimension: self.dimension,
            index_type: self.kind.as_str(),
        }
    }

    /// Metadata lookup by doc id.
    pub fn get_document(&self, doc_id: &str) -> Option<&CaseMetadata> {
        self.doc_ids
            .iter()
            .position(|id| id == doc_id)
            .map(|idx| &self.metadata[idx])
    }

    /// Replaces the index contents wholesale and trains the scan backend.
    ///
    /// Every vector is normalized to unit L2 norm before storage.
    pub fn build(
        &mut self,
        mut vectors: Vec<Vec<f32>>,
        doc_ids: Vec<String>,
        metadata: Vec<CaseMetadata>,
    ) -> Result<(), ApiError> {
        if vectors.len() != doc_ids.len() || doc_ids.len() != metadata.len() {
            return Err(ApiError::CardinalityMismatch(format!(
                "{} vectors, {} doc ids, {} metadata entries",
                vectors.len(),
                doc_ids.len(),
                metadata.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(ApiError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        for vector in &mut vectors {
            normalize(vector);
        }

        self.vectors = vectors;
        self.doc_ids = doc_ids;
        self.metadata = metadata;
        self.backend = Some(self.train_backend());

        tracing::info!(
            documents = self.doc_ids.len(),
            dimension = self.dimension,
            index_type = self.kind.as_str(),
            "Vector index built"
        );
        Ok(())
    }

    fn train_backend(&self) -> Box<dyn SearchBackend> {
        match self.kind {
            IndexKind::Flat => Box::new(FlatBackend),
            IndexKind::Ivf => Box::new(IvfBackend::train(&self.vectors)),
        }
    }

    /// Top-k similarity search. Read-only; callable concurrently.
    ///
    /// Results below `score_threshold` are dropped, as is any candidate
    /// index outside the id list (a sentinel from the scan strategy).
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievalHit>, ApiError> {
        let backend = self.backend.as_ref().ok_or(ApiError::NotBuilt)?;
        if query.len() != self.dimension {
            return Err(ApiError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut normalized = query.to_vec();
        normalize(&mut normalized);

        let candidates = backend.search(&self.vectors, &normalized, k);

        let mut hits = Vec::with_capacity(candidates.len());
        for (idx, score) in candidates {
            if let Some(threshold) = score_threshold {
                if score < threshold {
                    continue;
                }
            }
            if idx >= self.doc_ids.len() {
                continue;
            }
            hits.push(RetrievalHit {
                doc_id: self.doc_ids[idx].clone(),
                score,
                metadata: self.metadata[idx].clone(),
            });
        }

        Ok(hits)
    }

    /// `search` applied independently to each query row.
    pub fn batch_search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<Vec<RetrievalHit>>, ApiError> {
        queries
            .iter()
            .map(|query| self.search(query, k, score_threshold))
            .collect()
    }
}

/// Scales a vector to unit L2 norm in place. Zero vectors are left alone.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn meta(title: &str) -> CaseMetadata {
        CaseMetadata {
            title: title.to_string(),
            court: "Supreme Court of India".to_string(),
            date: "2020-01-15".to_string(),
            case_number: "123/2020".to_string(),
            size: 4096,
        }
    }

    /// Index over the canonical basis of `dim`, one document per axis.
    pub fn basis_index(kind: IndexKind, dim: usize, count: usize) -> VectorIndex {
        let mut index = VectorIndex::new(dim, kind);
        let vectors: Vec<Vec<f32>> = (0..count)
            .map(|i| {
                let mut v = vec![0.0; dim];
                v[i % dim] = 1.0;
                v
            })
            .collect();
        let doc_ids: Vec<String> = (0..count).map(|i| format!("doc_{i:04}")).collect();
        let metadata: Vec<CaseMetadata> =
            (0..count).map(|i| meta(&format!("Case {i}"))).collect();
        index.build(vectors, doc_ids, metadata).unwrap();
        index
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut once = vec![3.0, 4.0, 12.0];
        normalize(&mut once);
        let mut twice = once.clone();
        normalize(&mut twice);

        for (a, b) in once.iter().zip(twice.iter()) {
            assert!(approx_eq(*a, *b));
        }
        assert!(approx_eq(once.iter().map(|x| x * x).sum::<f32>().sqrt(), 1.0));
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut zero = vec![0.0, 0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn search_before_build_fails() {
        let index = VectorIndex::new(4, IndexKind::Flat);
        let err = index.search(&[1.0, 0.0, 0.0, 0.0], 3, None).unwrap_err();
        assert!(matches!(err, ApiError::NotBuilt));
    }

    #[test]
    fn build_rejects_wrong_dimension() {
        let mut index = VectorIndex::new(3, IndexKind::Flat);
        let err = index
            .build(
                vec![vec![1.0, 0.0]],
                vec!["doc_0000".to_string()],
                vec![meta("Case 0")],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn build_rejects_mismatched_cardinality() {
        let mut index = VectorIndex::new(2, IndexKind::Flat);
        let err = index
            .build(
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                vec!["doc_0000".to_string()],
                vec![meta("Case 0")],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::CardinalityMismatch(_)));
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let index = basis_index(IndexKind::Flat, 4, 4);
        let err = index.search(&[1.0, 0.0], 2, None).unwrap_err();
        assert!(matches!(err, ApiError::DimensionMismatch { expected: 4, actual: 2 }));
    }

    #[test]
    fn stored_vector_is_its_own_top_hit() {
        let index = basis_index(IndexKind::Flat, 8, 8);
        for i in 0..8 {
            let mut query = vec![0.0; 8];
            query[i] = 1.0;
            let hits = index.search(&query, 3, None).unwrap();
            assert_eq!(hits[0].doc_id, format!("doc_{i:04}"));
            assert!(approx_eq(hits[0].score, 1.0));
        }
    }

    #[test]
    fn search_respects_k_and_only_returns_known_ids() {
        let index = basis_index(IndexKind::Flat, 4, 4);
        let hits = index.search(&[0.5, 0.5, 0.5, 0.5], 2, None).unwrap();
        assert!(hits.len() <= 2);
        for hit in &hits {
            assert!(index.get_document(&hit.doc_id).is_some());
        }
    }

    #[test]
    fn raising_threshold_never_grows_result_count() {
        let index = basis_index(IndexKind::Flat, 4, 4);
        let query = vec![0.9, 0.3, 0.2, 0.1];

        let mut previous = usize::MAX;
        for threshold in [0.0_f32, 0.2, 0.5, 0.9] {
            let count = index.search(&query, 4, Some(threshold)).unwrap().len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let mut index = VectorIndex::new(2, IndexKind::Flat);
        // Three identical vectors: all ties against any query.
        index
            .build(
                vec![vec![1.0, 0.0]; 3],
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec![meta("A"), meta("B"), meta("C")],
            )
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 3, None).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn batch_search_is_per_row_independent() {
        let index = basis_index(IndexKind::Flat, 4, 4);
        let queries = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        let results = index.batch_search(&queries, 1, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0][0].doc_id, "doc_0000");
        assert_eq!(results[1][0].doc_id, "doc_0003");
    }

    #[test]
    fn ivf_finds_stored_vectors() {
        let index = basis_index(IndexKind::Ivf, 8, 64);
        for i in [0_usize, 17, 63] {
            let mut query = vec![0.0; 8];
            query[i % 8] = 1.0;
            let hits = index.search(&query, 4, None).unwrap();
            assert!(!hits.is_empty());
            assert!(approx_eq(hits[0].score, 1.0));
            for hit in &hits {
                assert!(index.get_document(&hit.doc_id).is_some());
            }
        }
    }

    #[test]
    fn get_document_returns_metadata() {
        let index = basis_index(IndexKind::Flat, 4, 4);
        assert_eq!(index.get_document("doc_0002").unwrap().title, "Case 2");
        assert!(index.get_document("missing").is_none());
    }
}
