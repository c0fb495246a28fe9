//! IVF-style clustered backend for corpora too large for a full scan.
//!
//! Training runs a small k-means over the normalized vectors; search probes
//! the lists of the closest centroids only. Recall is approximate by
//! construction, so tests of exact properties run on the flat backend.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{dot, normalize, IndexKind, SearchBackend};

const KMEANS_ITERATIONS: usize = 10;
const DEFAULT_NPROBE: usize = 8;
// Fixed seed keeps training (and therefore ranking) reproducible across
// save/load cycles of the same corpus.
const TRAIN_SEED: u64 = 0x1e9a1;

pub struct IvfBackend {
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<usize>>,
    nprobe: usize,
}

impl IvfBackend {
    pub fn train(vectors: &[Vec<f32>]) -> Self {
        let n = vectors.len();
        let nlist = (n / 10).clamp(1, 100);
        let mut rng = StdRng::seed_from_u64(TRAIN_SEED);

        // Seed centroids with distinct random members.
        let mut order: Vec<usize> = (0..n).collect();
        for i in 0..nlist.min(n) {
            let j = rng.random_range(i..n);
            order.swap(i, j);
        }
        let mut centroids: Vec<Vec<f32>> = order
            .iter()
            .take(nlist.min(n))
            .map(|&idx| vectors[idx].clone())
            .collect();
        if centroids.is_empty() {
            return IvfBackend {
                centroids,
                lists: Vec::new(),
                nprobe: DEFAULT_NPROBE,
            };
        }

        let mut assignments = vec![0_usize; n];
        for _ in 0..KMEANS_ITERATIONS {
            for (idx, vector) in vectors.iter().enumerate() {
                assignments[idx] = nearest_centroid(&centroids, vector);
            }

            for (list_idx, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&Vec<f32>> = assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, &a)| a == list_idx)
                    .map(|(idx, _)| &vectors[idx])
                    .collect();
                if members.is_empty() {
                    continue;
                }

                let dim = centroid.len();
                let mut mean = vec![0.0_f32; dim];
                for member in &members {
                    for (m, x) in mean.iter_mut().zip(member.iter()) {
                        *m += x;
                    }
                }
                for m in mean.iter_mut() {
                    *m /= members.len() as f32;
                }
                normalize(&mut mean);
                *centroid = mean;
            }
        }

        let mut lists = vec![Vec::new(); centroids.len()];
        for (idx, vector) in vectors.iter().enumerate() {
            lists[nearest_centroid(&centroids, vector)].push(idx);
        }

        IvfBackend {
            centroids,
            lists,
            nprobe: DEFAULT_NPROBE,
        }
    }
}

impl SearchBackend for IvfBackend {
    fn kind(&self) -> IndexKind {
        IndexKind::Ivf
    }

    fn search(&self, vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.centroids.is_empty() {
            return Vec::new();
        }

        let mut ranked_lists: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(idx, centroid)| (idx, dot(query, centroid)))
            .collect();
        ranked_lists.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut candidates: Vec<usize> = ranked_lists
            .iter()
            .take(self.nprobe.min(self.centroids.len()))
            .flat_map(|(list_idx, _)| self.lists[*list_idx].iter().copied())
            .collect();
        // Insertion order within the candidate set keeps ties stable.
        candidates.sort_unstable();

        let mut scored: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|idx| (idx, dot(query, &vectors[idx])))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn nearest_centroid(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let score = dot(centroid, vector);
        if score > best_score {
            best = idx;
            best_score = score;
        }
    }
    best
}
