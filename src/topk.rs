//! Bounded top-k accumulator for maximum inner product search.

use serde::{Deserialize, Serialize};

/// Scores closer than this are treated as equal.
pub const FLOATZERO: f32 = 1e-6;

/// One search result: a vector id and its score (inner product).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: u32,
    pub score: f32,
}

/// Keeps the `k` highest-scoring candidates seen so far, in descending order.
///
/// Once full, a candidate is admitted only if it beats the current k-th best
/// by more than [`FLOATZERO`]; the displaced k-th entry is dropped. Among
/// equal scores the earlier insertion ranks first.
#[derive(Debug, Clone)]
pub struct MaxKList {
    k: usize,
    entries: Vec<Neighbor>,
}

impl MaxKList {
    /// Create an empty list with capacity `k`.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            entries: Vec::with_capacity(k + 1),
        }
    }

    /// Capacity.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of entries currently held (at most `k`).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.k
    }

    /// Clear all entries, keeping the capacity.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Current k-th best score, or `f32::NEG_INFINITY` while not yet full.
    #[inline]
    pub fn threshold(&self) -> f32 {
        if self.is_full() {
            self.entries.last().map_or(f32::NEG_INFINITY, |e| e.score)
        } else {
            f32::NEG_INFINITY
        }
    }

    /// Offer a candidate and return the (possibly raised) k-th best score.
    pub fn insert(&mut self, score: f32, id: u32) -> f32 {
        if self.k == 0 {
            return f32::NEG_INFINITY;
        }
        if self.is_full() && score - self.threshold() <= FLOATZERO {
            return self.threshold();
        }

        let pos = self.entries.partition_point(|e| e.score >= score);
        if self.is_full() {
            self.entries.pop();
        }
        self.entries.insert(pos, Neighbor { id, score });
        self.threshold()
    }

    /// Id of the `i`-th best entry (0-based), if present.
    #[inline]
    pub fn ith_id(&self, i: usize) -> Option<u32> {
        self.entries.get(i).map(|e| e.id)
    }

    /// Score of the `i`-th best entry (0-based), if present.
    #[inline]
    pub fn ith_key(&self, i: usize) -> Option<f32> {
        self.entries.get(i).map(|e| e.score)
    }

    /// Entries in descending score order.
    #[inline]
    pub fn as_slice(&self) -> &[Neighbor] {
        &self.entries
    }

    /// Copy out the entries in descending score order.
    pub fn to_vec(&self) -> Vec<Neighbor> {
        self.entries.clone()
    }
}
