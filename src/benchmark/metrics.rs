//! Score-threshold recall metrics for MIP results.
//!
//! Inner products tie often, so comparing id sets would punish a candidate
//! for returning an equally good vector with a different id. These metrics
//! compare *scores* instead: a candidate entry counts as a hit if its score is
//! at least the reference's k-th best score, up to [`FLOATZERO`].
//!
//! - `calc_recall(k)`: hits among the candidate's top k, as a percentage of k
//! - `get_hits(k, t)`: hits among the candidate's top k against the
//!   reference's t-th best score, capped at t

use serde::{Deserialize, Serialize};

use crate::topk::{MaxKList, Neighbor, FLOATZERO};

/// Recall cut-offs reported by default.
pub const RECALL_KS: [usize; 7] = [1, 2, 5, 10, 20, 50, 100];

/// Anything that exposes a ranked list of scores, best first.
pub trait RankedScores {
    /// Score of the `i`-th best entry, if present.
    fn ranked_score(&self, i: usize) -> Option<f32>;
}

impl RankedScores for MaxKList {
    fn ranked_score(&self, i: usize) -> Option<f32> {
        self.ith_key(i)
    }
}

impl RankedScores for [Neighbor] {
    fn ranked_score(&self, i: usize) -> Option<f32> {
        self.get(i).map(|n| n.score)
    }
}

impl RankedScores for Vec<Neighbor> {
    fn ranked_score(&self, i: usize) -> Option<f32> {
        self.as_slice().ranked_score(i)
    }
}

/// Count candidate entries among the top `k` that reach `bar`.
///
/// Walks back from position `k - 1` while the candidate falls short of `bar`
/// by more than [`FLOATZERO`]. Missing entries never reach the bar.
fn count_reaching<C: RankedScores + ?Sized>(k: usize, bar: f32, candidate: &C) -> usize {
    let mut i = k;
    while i > 0 {
        let score = candidate.ranked_score(i - 1).unwrap_or(f32::NEG_INFINITY);
        if bar - score > FLOATZERO {
            i -= 1;
        } else {
            break;
        }
    }
    i
}

/// Recall@k in percent, `[0, 100]`.
///
/// `k` is clamped to the length of `truth`; an empty truth or `k == 0` gives 0.
pub fn calc_recall<C: RankedScores + ?Sized>(k: usize, truth: &[Neighbor], candidate: &C) -> f32 {
    let k = k.min(truth.len());
    if k == 0 {
        return 0.0;
    }
    let hits = count_reaching(k, truth[k - 1].score, candidate);
    hits as f32 * 100.0 / k as f32
}

/// Number of the candidate's top `k` that reach the reference's `t`-th best
/// score, capped at `t`.
///
/// `t` is clamped to the length of `truth`.
pub fn get_hits<C: RankedScores + ?Sized>(k: usize, t: usize, truth: &[Neighbor], candidate: &C) -> usize {
    let t = t.min(truth.len());
    if k == 0 || t == 0 {
        return 0;
    }
    count_reaching(k, truth[t - 1].score, candidate).min(t)
}

/// Mean recall@k in percent over paired query results.
///
/// Pairs are taken in order; extra entries on either side are ignored.
pub fn mean_recall(k: usize, truths: &[Vec<Neighbor>], candidates: &[Vec<Neighbor>]) -> f32 {
    let n = truths.len().min(candidates.len());
    if n == 0 {
        return 0.0;
    }
    let total: f32 = truths
        .iter()
        .zip(candidates)
        .map(|(t, c)| calc_recall(k, t, c))
        .sum();
    total / n as f32
}

/// Mean recall at one cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecallAtK {
    pub k: usize,
    pub recall: f32,
}

/// Mean recall across several cut-offs for one candidate result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallSummary {
    pub n_queries: usize,
    pub rows: Vec<RecallAtK>,
}

impl RecallSummary {
    /// Evaluate every `k` in `ks`. Cut-offs deeper than either side are skipped.
    pub fn compute(ks: &[usize], truths: &[Vec<Neighbor>], candidates: &[Vec<Neighbor>]) -> Self {
        let depth = |rows: &[Vec<Neighbor>]| rows.iter().map(Vec::len).min().unwrap_or(0);
        let limit = depth(truths).min(depth(candidates));
        let rows = ks
            .iter()
            .filter(|&&k| k > 0 && k <= limit)
            .map(|&k| RecallAtK {
                k,
                recall: mean_recall(k, truths, candidates),
            })
            .collect();
        Self {
            n_queries: truths.len().min(candidates.len()),
            rows,
        }
    }

    /// Recall at `k`, if it was evaluated.
    pub fn recall_at(&self, k: usize) -> Option<f32> {
        self.rows.iter().find(|r| r.k == k).map(|r| r.recall)
    }
}
