//! Benchmarks for the norm-sorted exact MIP scan.
//!
//! Uniform data has nearly equal norms, so the global cut-off rarely fires;
//! skewed-norm data is the workload the scan is built for.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mipscan::benchmark::{skewed_norm_dataset, uniform_dataset, Dataset};
use mipscan::MipSearch;

fn run(c: &mut Criterion, name: &str, make: impl Fn(usize) -> Dataset) {
    let mut group = c.benchmark_group(name);
    group.sample_size(20);

    for n in [1_000usize, 10_000, 50_000].iter() {
        let ds = make(*n);
        let search = MipSearch::new(&ds.data);
        group.throughput(Throughput::Elements(ds.queries.len() as u64));

        for k in [1usize, 10, 100].iter() {
            group.bench_with_input(BenchmarkId::new(format!("k{k}"), n), n, |bench, _| {
                bench.iter(|| search.search_all(&ds.queries, *k).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_uniform(c: &mut Criterion) {
    run(c, "scan_uniform", |n| uniform_dataset(n, 50, 128, 42).unwrap());
}

fn bench_skewed(c: &mut Criterion) {
    run(c, "scan_skewed_norms", |n| skewed_norm_dataset(n, 50, 128, 100.0, 42).unwrap());
}

criterion_group!(benches, bench_uniform, bench_skewed);
criterion_main!(benches);
