//! Entity store benchmarks.
//!
//! Every save rewrites the whole backing file of each touched type, so the
//! cost of one save grows with the collection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flatdb_bench::{applicants, memory_store, populated_store};
use flatdb_core::Config;
use flatdb_housing::{FlatUnit, Project, User};
use tempfile::TempDir;

/// Benchmark one user save against a growing user collection.
fn bench_save_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_user_memory");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut store = memory_store();
            for user in applicants(size) {
                store.save(&user).unwrap();
            }
            let probe = applicants(1).remove(0);

            b.iter(|| store.save(black_box(&probe)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark one user save with atomic file replacement.
fn bench_save_to_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_user_files");
    group.sample_size(20);

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let config = Config::new().create_if_missing(true).sync_writes(false);
            let mut store = flatdb_housing::open(dir.path(), config).unwrap();
            for user in applicants(size) {
                store.save(&user).unwrap();
            }
            let probe = applicants(1).remove(0);

            b.iter(|| store.save(black_box(&probe)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark predicate queries over flat units.
fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_units");

    for projects in [10, 100].iter() {
        let store = populated_store(*projects, 20);
        let target = format!("Project {:04}", projects / 2);
        group.bench_with_input(BenchmarkId::from_parameter(projects), &target, |b, target| {
            b.iter(|| {
                let found = store.query_by(&[FlatUnit::in_project(target), FlatUnit::available()]);
                black_box(found.len())
            });
        });
    }
    group.finish();
}

/// Benchmark a cascading project delete, rebuilt each iteration.
fn bench_cascade_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_delete_project");
    group.sample_size(20);

    for units in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(units), units, |b, &units| {
            b.iter_batched(
                || populated_store(5, units),
                |mut store| {
                    let project: Project = store.get_by_key("Project 0002").unwrap();
                    store.delete(&project).unwrap();
                    black_box(store.len::<FlatUnit>())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

/// Benchmark a full reload from the backing stores.
fn bench_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("reload");
    group.sample_size(20);

    for projects in [10, 50].iter() {
        let mut store = populated_store(*projects, 20);
        group.bench_function(BenchmarkId::from_parameter(projects), |b| {
            b.iter(|| {
                store.reload().unwrap();
                black_box(store.len::<User>())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_save_in_memory,
    bench_save_to_files,
    bench_query,
    bench_cascade_delete,
    bench_reload,
);

criterion_main!(benches);
