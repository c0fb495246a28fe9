//! Index persistence.
//!
//! Three artifacts are written and read together: a binary vector block
//! (`vectors.bin`, count/dim header + little-endian f32 payload), the
//! ordered doc-id list (`doc_ids.json`), and the metadata array
//! (`metadata.json`). A load where the three disagree on length fails
//! loudly instead of silently truncating.

use std::fs;
use std::path::Path;

use crate::errors::ApiError;
use crate::rag::types::CaseMetadata;

use super::{IndexKind, VectorIndex};

const VECTORS_FILE: &str = "vectors.bin";
const DOC_IDS_FILE: &str = "doc_ids.json";
const METADATA_FILE: &str = "metadata.json";

impl VectorIndex {
    pub fn save(&self, dir: &Path) -> Result<(), ApiError> {
        fs::create_dir_all(dir).map_err(ApiError::internal)?;

        let mut block =
            Vec::with_capacity(8 + self.vectors.len() * self.dimension * 4);
        block.extend_from_slice(&(self.vectors.len() as u32).to_le_bytes());
        block.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        for vector in &self.vectors {
            for value in vector {
                block.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(dir.join(VECTORS_FILE), block).map_err(ApiError::internal)?;

        let doc_ids = serde_json::to_string(&self.doc_ids).map_err(ApiError::internal)?;
        fs::write(dir.join(DOC_IDS_FILE), doc_ids).map_err(ApiError::internal)?;

        let metadata = serde_json::to_string_pretty(&self.metadata).map_err(ApiError::internal)?;
        fs::write(dir.join(METADATA_FILE), metadata).map_err(ApiError::internal)?;

        tracing::info!(
            documents = self.vectors.len(),
            dir = %dir.display(),
            "Vector index saved"
        );
        Ok(())
    }

    pub fn load(dir: &Path, kind: IndexKind) -> Result<Self, ApiError> {
        let block = fs::read(dir.join(VECTORS_FILE)).map_err(|err| {
            ApiError::Internal(format!(
                "Failed to read {}: {err}",
                dir.join(VECTORS_FILE).display()
            ))
        })?;
        if block.len() < 8 {
            return Err(ApiError::Internal(
                "Vector block too short for its header".to_string(),
            ));
        }

        let count = u32::from_le_bytes([block[0], block[1], block[2], block[3]]) as usize;
        let dimension = u32::from_le_bytes([block[4], block[5], block[6], block[7]]) as usize;
        let payload = &block[8..];
        if payload.len() != count * dimension * 4 {
            return Err(ApiError::CardinalityMismatch(format!(
                "vector block declares {count}x{dimension} but carries {} bytes",
                payload.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = payload
            .chunks_exact(dimension * 4)
            .map(|row| {
                row.chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect()
            })
            .collect();

        let doc_ids_raw =
            fs::read_to_string(dir.join(DOC_IDS_FILE)).map_err(ApiError::internal)?;
        let doc_ids: Vec<String> =
            serde_json::from_str(&doc_ids_raw).map_err(ApiError::internal)?;

        let metadata_raw =
            fs::read_to_string(dir.join(METADATA_FILE)).map_err(ApiError::internal)?;
        let metadata: Vec<CaseMetadata> =
            serde_json::from_str(&metadata_raw).map_err(ApiError::internal)?;

        if doc_ids.len() != count || metadata.len() != count {
            return Err(ApiError::CardinalityMismatch(format!(
                "{count} vectors, {} doc ids, {} metadata entries",
                doc_ids.len(),
                metadata.len()
            )));
        }

        let mut index = VectorIndex::new(dimension, kind);
        // Vectors were normalized before save; build normalizes again, which
        // is a no-op on unit vectors.
        index.build(vectors, doc_ids, metadata)?;

        tracing::info!(
            documents = index.len(),
            dimension = index.dimension(),
            dir = %dir.display(),
            "Vector index loaded"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::meta;
    use super::*;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(3, IndexKind::Flat);
        index
            .build(
                vec![
                    vec![1.0, 0.2, 0.0],
                    vec![0.1, 1.0, 0.3],
                    vec![0.0, 0.2, 1.0],
                ],
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec![meta("A"), meta("B"), meta("C")],
            )
            .unwrap();
        index
    }

    #[test]
    fn round_trip_preserves_ranking() {
        let tmp = tempfile::tempdir().unwrap();
        let original = sample_index();
        original.save(tmp.path()).unwrap();

        let reloaded = VectorIndex::load(tmp.path(), IndexKind::Flat).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.dimension(), 3);

        let probes = [
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.7, 0.7, 0.0],
            vec![0.2, 0.3, 0.9],
        ];
        for probe in &probes {
            let before = original.search(probe, 1, None).unwrap();
            let after = reloaded.search(probe, 1, None).unwrap();
            assert_eq!(before[0].doc_id, after[0].doc_id);
        }
    }

    #[test]
    fn load_fails_on_disagreeing_lengths() {
        let tmp = tempfile::tempdir().unwrap();
        sample_index().save(tmp.path()).unwrap();

        // Drop one doc id so the three artifacts disagree.
        std::fs::write(tmp.path().join("doc_ids.json"), r#"["a","b"]"#).unwrap();

        let err = VectorIndex::load(tmp.path(), IndexKind::Flat).unwrap_err();
        assert!(matches!(err, ApiError::CardinalityMismatch(_)));
    }

    #[test]
    fn load_fails_on_truncated_vector_block() {
        let tmp = tempfile::tempdir().unwrap();
        sample_index().save(tmp.path()).unwrap();

        let block = std::fs::read(tmp.path().join("vectors.bin")).unwrap();
        std::fs::write(tmp.path().join("vectors.bin"), &block[..block.len() - 4]).unwrap();

        let err = VectorIndex::load(tmp.path(), IndexKind::Flat).unwrap_err();
        assert!(matches!(err, ApiError::CardinalityMismatch(_)));
    }

    #[test]
    fn load_fails_on_missing_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(VectorIndex::load(tmp.path(), IndexKind::Flat).is_err());
    }
}
