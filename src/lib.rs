//! mipscan: exact top-k Maximum Inner Product Search by pruned linear scan.
//!
//! The reference oracle for evaluating approximate MIP algorithms. Given a
//! data collection and a query collection, it returns the exact top-k data
//! vectors by inner product for every query, and measures how close an
//! approximate result set comes to that reference.
//!
//! - `store`: vectors in one flat buffer plus per-vector suffix-norm bounds
//! - `kernel`: threshold-pruned inner product and squared L2
//! - `topk`: bounded top-k accumulator
//! - `search`: norm-sorted scan driver
//! - `benchmark`: ground truth files, recall and hit counts, synthetic data
//!
//! # How the pruning works
//!
//! For vectors `x` and `q`, Cauchy–Schwarz gives `x·q <= ‖x‖·‖q‖`. Two cuts
//! follow from it:
//!
//! 1. **Global**: data is scanned in descending norm order, so once
//!    `‖x‖·‖q‖` drops to the current k-th best score, nothing after `x` can
//!    enter the result and the scan ends.
//! 2. **Per candidate**: after each block of 8 dimensions, the remaining
//!    dimensions add at most the product of the two suffix norms. If the
//!    partial product plus that bound cannot beat the k-th best, the
//!    candidate is dropped without finishing the product.
//!
//! Both cuts are exact: the results equal an exhaustive scan.
//!
//! ```rust
//! use mipscan::{MipSearch, VectorStore};
//!
//! let data = VectorStore::from_vectors(2, &[[1.0_f32, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
//! let top = MipSearch::new(&data).search(&[1.0, 1.0], 2).unwrap();
//! assert_eq!(top[0].id, 2);
//! assert_eq!(top[1].score, 1.0);
//! ```

pub mod benchmark;
pub mod error;
pub mod kernel;
pub mod search;
pub mod store;
pub mod topk;

// Re-exports
pub use error::{Error, Result};
pub use kernel::{inner_product, l2_squared, pruned_inner_product, pruned_l2_squared, NormBounds, BLOCK, NORM_K};
pub use search::{MipSearch, ScanStats, SearchReport};
pub use store::{suffix_norms, Encoding, LoadReport, NormHistogram, VectorStore, NORM_BUCKETS};
pub use topk::{MaxKList, Neighbor, FLOATZERO};
