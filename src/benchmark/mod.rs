//! Ground truth generation and recall evaluation for MIP algorithms.
//!
//! The exact searcher in [`crate::search`] is the reference oracle. This
//! module runs it at a fixed depth ([`MAXK`]) to produce ground truth files,
//! and scores approximate result sets against them:
//!
//! - **Recall@k**: share of a candidate's top k whose scores reach the
//!   reference k-th best score (in percent)
//! - **Hits(k, t)**: raw count of a candidate's top k reaching the reference
//!   t-th best score, capped at t
//!
//! Synthetic collections for tests and benchmarks live in [`datasets`].

pub mod datasets;
pub mod metrics;
pub mod truth;

pub use datasets::{clustered_dataset, skewed_norm_dataset, uniform_dataset, Dataset};
pub use metrics::{calc_recall, get_hits, mean_recall, RankedScores, RecallAtK, RecallSummary, RECALL_KS};
pub use truth::{ground_truth, GroundTruth, GroundTruthReport, MAXK};
