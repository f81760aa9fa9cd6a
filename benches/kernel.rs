//! Benchmarks for the pruned similarity kernels.
//!
//! Compares the exact inner product against the pruned one at a threshold
//! that never prunes, one that prunes after the first block, and the squared
//! L2 kernel with and without a threshold.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mipscan::benchmark::uniform_dataset;
use mipscan::{inner_product, l2_squared, pruned_inner_product, pruned_l2_squared};

const DIMS: [usize; 5] = [32, 64, 128, 384, 768];

fn bench_inner_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_product");

    for dim in DIMS.iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let ds = uniform_dataset(2, 0, *dim, 42).unwrap();
        let (a, na) = (ds.data.vector(0), ds.data.norms(0));
        let (b, nb) = (ds.data.vector(1), ds.data.norms(1));

        group.bench_with_input(BenchmarkId::new("exact", dim), dim, |bench, _| {
            bench.iter(|| inner_product(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("pruned_no_exit", dim), dim, |bench, _| {
            bench.iter(|| pruned_inner_product(f32::NEG_INFINITY, black_box(a), na, black_box(b), nb));
        });
        // A threshold at the Cauchy–Schwarz ceiling exits after the first block.
        let ceiling = na[0] * nb[0];
        group.bench_with_input(BenchmarkId::new("pruned_first_block", dim), dim, |bench, _| {
            bench.iter(|| pruned_inner_product(black_box(ceiling), black_box(a), na, black_box(b), nb));
        });
    }

    group.finish();
}

fn bench_l2_squared(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_squared");

    for dim in DIMS.iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let ds = uniform_dataset(2, 0, *dim, 7).unwrap();
        let (a, b) = (ds.data.vector(0), ds.data.vector(1));

        group.bench_with_input(BenchmarkId::new("exact", dim), dim, |bench, _| {
            bench.iter(|| l2_squared(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("pruned", dim), dim, |bench, _| {
            bench.iter(|| pruned_l2_squared(black_box(1.0), black_box(a), black_box(b)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inner_product, bench_l2_squared);
criterion_main!(benches);
