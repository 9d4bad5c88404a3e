//! Sequence reservation and accession minting benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pride_bench::{generate_files, memory_store};
use pride_core::model::ArchiveFile;
use pride_core::service::FileService;
use pride_core::store::Database;
use pride_core::{Config, SequenceAllocator};
use std::sync::Arc;
use tempfile::TempDir;

/// Benchmark reserving blocks of growing size from an in-memory store.
fn bench_reserve(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve");

    for count in [1u64, 100, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let allocator = SequenceAllocator::new(memory_store());
            b.iter(|| {
                let start = allocator.reserve(black_box("bench"), count).unwrap();
                black_box(start);
            });
        });
    }
    group.finish();
}

/// Benchmark reservations against an on-disk log, with and without fsync.
fn bench_reserve_on_disk(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_on_disk");
    group.sample_size(20);

    for sync in [false, true].iter() {
        group.bench_with_input(BenchmarkId::new("sync", sync), sync, |b, &sync| {
            let dir = TempDir::new().unwrap();
            let config = Config::default().sync_on_write(sync);
            let db = Database::open(dir.path().join("bench"), config).unwrap();
            let allocator = SequenceAllocator::new(Arc::new(db));
            b.iter(|| {
                let start = allocator.reserve(black_box("bench"), 1).unwrap();
                black_box(start);
            });
        });
    }
    group.finish();
}

/// Benchmark inserting files one by one against one batch.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_files");

    for count in [10usize, 100].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("single", count), count, |b, &count| {
            let files = FileService::new(memory_store(), &Config::default());
            b.iter(|| {
                for mut file in generate_files(count) {
                    black_box(files.insert(&mut file).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("batch", count), count, |b, &count| {
            let files = FileService::new(memory_store(), &Config::default());
            b.iter(|| {
                let results = files.insert_all(black_box(generate_files(count))).unwrap();
                black_box(results);
            });
        });
    }
    group.finish();
}

/// Benchmark minting when the entity already has an accession.
fn bench_refused_insert(c: &mut Criterion) {
    c.bench_function("insert_refused", |b| {
        let files = FileService::new(memory_store(), &Config::default());
        let mut file = ArchiveFile::new("given.raw");
        file.accession = Some("PXF00000000001".to_string());
        b.iter(|| {
            black_box(files.insert(black_box(&mut file)).is_err());
        });
    });
}

criterion_group!(
    benches,
    bench_reserve,
    bench_reserve_on_disk,
    bench_insert,
    bench_refused_insert,
);

criterion_main!(benches);
