//! Cosine-similarity ranking over an embedded corpus.
//!
//! Scores every corpus chunk against a query vector, selects the top-k
//! by partial selection (a bounded heap, not a full sort), then drops
//! entries below the similarity threshold. Because the threshold is
//! applied after selection, a query can legitimately return fewer than
//! `top_k` results, including zero.
//!
//! The similarity pass is read-only and runs in parallel over the
//! corpus via `rayon`; no shared mutable state is involved. Ties are
//! broken by original corpus order, so ranking is fully deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::models::{Chunk, RankedChunk};

/// Compute cosine similarity between two embedding vectors.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// when either norm is zero — a zero vector can never be judged
/// relevant, and degenerate inputs must never panic.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// A scored corpus entry ordered by similarity, ties by corpus index.
///
/// Greater means "ranks higher": larger similarity wins, and on equal
/// similarity the earlier corpus entry wins.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scored {
    similarity: f32,
    index: usize,
}

impl Eq for Scored {}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.similarity
            .total_cmp(&other.similarity)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rank corpus chunks against a query vector.
///
/// Returns at most `top_k` chunks with similarity ≥ `threshold`, sorted
/// by similarity descending with ties broken by original corpus order.
/// Similarities are clamped to `[0.0, 1.0]`. Chunks without an attached
/// embedding score `0.0` and are only returned when the threshold is
/// itself `0.0`.
pub fn rank(corpus: &[Chunk], query_vec: &[f32], top_k: usize, threshold: f32) -> Vec<RankedChunk> {
    if corpus.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let scores: Vec<Scored> = corpus
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let similarity = chunk
                .embedding
                .as_deref()
                .map(|v| cosine_similarity(v, query_vec))
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            Scored { similarity, index }
        })
        .collect();

    // Partial top-k selection: a min-heap of the k best seen so far.
    let mut heap: BinaryHeap<std::cmp::Reverse<Scored>> = BinaryHeap::with_capacity(top_k);
    for s in scores {
        if heap.len() < top_k {
            heap.push(std::cmp::Reverse(s));
        } else if let Some(min) = heap.peek() {
            if s > min.0 {
                heap.pop();
                heap.push(std::cmp::Reverse(s));
            }
        }
    }

    let mut selected: Vec<Scored> = heap.into_iter().map(|r| r.0).collect();
    selected.sort_by(|a, b| b.cmp(a));

    selected
        .into_iter()
        .filter(|s| s.similarity >= threshold)
        .map(|s| RankedChunk {
            chunk: corpus[s.index].clone(),
            similarity: s.similarity,
        })
        .collect()
}
