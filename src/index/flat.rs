//! Exact linear-scan backend, the reference implementation.

use std::cmp::Ordering;

use super::{dot, IndexKind, SearchBackend};

pub struct FlatBackend;

impl SearchBackend for FlatBackend {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }

    fn search(&self, vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(idx, vector)| (idx, dot(query, vector)))
            .collect();

        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }
}
