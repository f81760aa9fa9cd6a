//! Seeded synthetic collections for tests and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::store::VectorStore;

/// A data collection and a query collection of the same dimension.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub data: VectorStore,
    pub queries: VectorStore,
}

impl Dataset {
    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.data.dim()
    }

    /// Raw vector memory in bytes.
    pub fn memory_bytes(&self) -> usize {
        (self.data.len() + self.queries.len()) * self.dim() * std::mem::size_of::<f32>()
    }
}

fn sample_flat(rng: &mut StdRng, n: usize, dim: usize, mut f: impl FnMut(&mut StdRng) -> f32) -> Vec<f32> {
    (0..n * dim).map(|_| f(rng)).collect()
}

/// Vectors with coordinates uniform in `[-1, 1)`.
pub fn uniform_dataset(n: usize, qn: usize, dim: usize, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = sample_flat(&mut rng, n, dim, |r| r.random_range(-1.0..1.0));
    let queries = sample_flat(&mut rng, qn, dim, |r| r.random_range(-1.0..1.0));
    Ok(Dataset {
        data: VectorStore::from_flat(dim, data)?,
        queries: VectorStore::from_flat(dim, queries)?,
    })
}

/// Uniform directions with data norms spread over `(0, max_scale]`.
///
/// Inner-product workloads usually have a long tail of norms, which is where
/// the norm-sorted scan earns its keep; uniform data has nearly equal norms.
pub fn skewed_norm_dataset(n: usize, qn: usize, dim: usize, max_scale: f32, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(n * dim);
    for _ in 0..n {
        // Squaring the draw puts most vectors at small norms.
        let u: f32 = rng.random();
        let scale = max_scale * (u * u).max(1e-3);
        data.extend((0..dim).map(|_| scale * rng.random_range(-1.0_f32..1.0)));
    }
    let queries = sample_flat(&mut rng, qn, dim, |r| r.random_range(-1.0..1.0));
    Ok(Dataset {
        data: VectorStore::from_flat(dim, data)?,
        queries: VectorStore::from_flat(dim, queries)?,
    })
}

/// Gaussian clusters around `n_clusters` random centers in `[0, 1)^dim`.
pub fn clustered_dataset(
    n: usize,
    qn: usize,
    dim: usize,
    n_clusters: usize,
    cluster_std: f32,
    seed: u64,
) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_clusters = n_clusters.max(1);

    let centers: Vec<Vec<f32>> = (0..n_clusters)
        .map(|_| (0..dim).map(|_| rng.random::<f32>()).collect())
        .collect();

    let sample_near = |rng: &mut StdRng, center: &[f32], out: &mut Vec<f32>| {
        out.extend(center.iter().map(|&c| {
            // Box-Muller
            let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
            let u2: f32 = rng.random();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
            c + z * cluster_std
        }));
    };

    let mut data = Vec::with_capacity(n * dim);
    for _ in 0..n {
        let c = rng.random_range(0..n_clusters);
        sample_near(&mut rng, &centers[c], &mut data);
    }
    let mut queries = Vec::with_capacity(qn * dim);
    for _ in 0..qn {
        let c = rng.random_range(0..n_clusters);
        sample_near(&mut rng, &centers[c], &mut queries);
    }

    Ok(Dataset {
        data: VectorStore::from_flat(dim, data)?,
        queries: VectorStore::from_flat(dim, queries)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_shapes() {
        let ds = uniform_dataset(100, 10, 64, 42).unwrap();
        assert_eq!(ds.data.len(), 100);
        assert_eq!(ds.queries.len(), 10);
        assert_eq!(ds.dim(), 64);
        assert_eq!(ds.memory_bytes(), 110 * 64 * 4);
        assert!(ds.data.iter().all(|(v, _)| v.iter().all(|x| (-1.0..1.0).contains(x))));
    }

    #[test]
    fn seeds_are_reproducible() {
        let a = skewed_norm_dataset(50, 5, 16, 10.0, 7).unwrap();
        let b = skewed_norm_dataset(50, 5, 16, 10.0, 7).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.queries, b.queries);
    }

    #[test]
    fn skewed_norms_vary() {
        let ds = skewed_norm_dataset(500, 1, 32, 10.0, 3).unwrap();
        let norms: Vec<f32> = (0..ds.data.len()).map(|i| ds.data.norm(i)).collect();
        let max = norms.iter().cloned().fold(0.0, f32::max);
        let min = norms.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!(max > 10.0 * min);
    }

    #[test]
    fn clustered_shapes() {
        let ds = clustered_dataset(200, 20, 24, 4, 0.05, 42).unwrap();
        assert_eq!(ds.data.len(), 200);
        assert_eq!(ds.queries.len(), 20);
    }
}
