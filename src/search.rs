//! Exact top-k maximum inner product search by norm-sorted linear scan.
//!
//! Data ids are visited in descending order of their full norm. For a query
//! `q` and current k-th best score `θ`, a candidate `x` with `‖x‖·‖q‖ <= θ`
//! cannot enter the result, and neither can any candidate after it (their
//! norms are no larger). So the scan stops there. Candidates that survive
//! that test go through [`pruned_inner_product`] with `θ` as the bound.
//!
//! Every cut is backed by a Cauchy–Schwarz upper bound, so the results are
//! identical to an exhaustive scan in the same visiting order.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::{pruned_inner_product, NormBounds};
use crate::store::{suffix_norms, VectorStore};
use crate::topk::{MaxKList, Neighbor};

/// Work counters for one or more query scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Candidates passed to the inner-product kernel.
    pub evaluated: u64,
    /// Candidates never touched because of the global norm cut-off.
    pub skipped: u64,
}

impl ScanStats {
    /// Add another scan's counters into this one.
    pub fn merge(&mut self, other: ScanStats) {
        self.evaluated += other.evaluated;
        self.skipped += other.skipped;
    }

    /// Fraction of candidates that reached the kernel.
    pub fn evaluated_ratio(&self) -> f64 {
        let total = self.evaluated + self.skipped;
        if total == 0 {
            return 0.0;
        }
        self.evaluated as f64 / total as f64
    }
}

/// Results of a batch search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// One result set per query, descending score.
    pub results: Vec<Vec<Neighbor>>,
    pub elapsed: Duration,
    pub stats: ScanStats,
}

/// Norm-sorted exact MIP searcher over a borrowed data collection.
///
/// The descending-norm order is computed once and shared read-only by every
/// query.
#[derive(Debug, Clone)]
pub struct MipSearch<'a> {
    data: &'a VectorStore,
    order: Vec<u32>,
}

impl<'a> MipSearch<'a> {
    pub fn new(data: &'a VectorStore) -> Self {
        Self {
            data,
            order: data.ids_by_norm_desc(),
        }
    }

    /// The data collection being searched.
    pub fn data(&self) -> &'a VectorStore {
        self.data
    }

    /// Data ids in scan order.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    fn check(&self, dim: usize, k: usize) -> Result<()> {
        if k == 0 {
            return Err(Error::InvalidParameter("k must be > 0".into()));
        }
        if dim != self.data.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.data.dim(),
                actual: dim,
            });
        }
        Ok(())
    }

    /// Top-k for a single query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check(query.len(), k)?;
        let mut list = MaxKList::new(k);
        self.scan(query, &suffix_norms(query), &mut list);
        Ok(list.to_vec())
    }

    /// Top-k for every vector of `queries`.
    pub fn search_all(&self, queries: &VectorStore, k: usize) -> Result<SearchReport> {
        self.check(queries.dim(), k)?;
        let start = Instant::now();

        let mut list = MaxKList::new(k);
        let mut stats = ScanStats::default();
        let mut results = Vec::with_capacity(queries.len());
        for (query, norms) in queries.iter() {
            stats.merge(self.scan(query, norms, &mut list));
            results.push(list.to_vec());
        }

        let elapsed = start.elapsed();
        debug!(
            queries = queries.len(),
            k,
            evaluated = stats.evaluated,
            skipped = stats.skipped,
            elapsed_ms = elapsed.as_millis() as u64,
            "mip scan finished"
        );
        Ok(SearchReport {
            results,
            elapsed,
            stats,
        })
    }

    /// Run one query scan into `list`, which is reset first.
    ///
    /// `norms` must be the suffix-norm bounds of `query`; the query length must
    /// match the data dimension.
    pub fn scan(&self, query: &[f32], norms: &NormBounds, list: &mut MaxKList) -> ScanStats {
        debug_assert_eq!(query.len(), self.data.dim());
        list.reset();

        let q_norm = norms[0];
        let mut kip = list.threshold();
        let mut stats = ScanStats::default();

        for (pos, &id) in self.order.iter().enumerate() {
            let idx = id as usize;
            if self.data.norm(idx) * q_norm <= kip {
                stats.skipped = (self.order.len() - pos) as u64;
                break;
            }
            let ip = pruned_inner_product(kip, self.data.vector(idx), self.data.norms(idx), query, norms);
            stats.evaluated += 1;
            kip = list.insert(ip, id);
        }
        stats
    }
}
