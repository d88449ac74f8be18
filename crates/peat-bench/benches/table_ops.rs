//! Criterion micro-benchmarks for hash table operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use peat_alloc::HeapAllocator;
use peat_bench::pre_sized_table_options;
use peat_collections::{HashTable, TableOptions};

/// Benchmark: insert 1K integer keys into an empty table (growth included).
fn bench_table_insert_1k(c: &mut Criterion) {
    let heap = HeapAllocator::new();
    c.bench_function("table_insert_1k", |b| {
        b.iter(|| {
            let mut table: HashTable<u64, u64> = HashTable::new(&heap);
            for k in 0..1000u64 {
                table.set(&heap, k, k);
            }
            black_box(table.len());
        });
    });
}

/// Benchmark: lookups against a pre-sized 10K-entry table.
fn bench_table_get_10k(c: &mut Criterion) {
    let heap = HeapAllocator::new();
    let mut table: HashTable<u64, u64> =
        HashTable::with_options(&heap, pre_sized_table_options(10_000));
    for k in 0..10_000u64 {
        table.set(&heap, k, !k);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    c.bench_function("table_get_10k", |b| {
        b.iter(|| {
            let k = rng.random_range(0..10_000u64);
            black_box(table.get(k, 0));
        });
    });
}

/// Benchmark: delete/insert churn holding the table at its load ceiling.
fn bench_table_churn(c: &mut Criterion) {
    let heap = HeapAllocator::new();
    let mut table: HashTable<u64, u64> =
        HashTable::with_options(&heap, pre_sized_table_options(4096));
    for k in 0..4096u64 {
        table.set(&heap, k, k);
    }
    let mut next = 4096u64;
    c.bench_function("table_churn", |b| {
        b.iter(|| {
            table.delete(&heap, next - 4096);
            table.set(&heap, next, next);
            next += 1;
        });
    });
}

/// Benchmark: string keys in borrowed vs copied mode.
fn bench_table_string_keys(c: &mut Criterion) {
    let heap = HeapAllocator::new();
    let keys: Vec<String> = (0..1000).map(|i| format!("module/{i:04}.c")).collect();

    c.bench_function("table_string_borrowed_1k", |b| {
        b.iter(|| {
            let mut table: HashTable<&str, u32> = HashTable::new(&heap);
            for (i, key) in keys.iter().enumerate() {
                table.set(&heap, key.as_str(), i as u32);
            }
            black_box(table.len());
        });
    });

    c.bench_function("table_string_copied_1k", |b| {
        b.iter(|| {
            let mut table: HashTable<&str, u32> = HashTable::with_options(
                &heap,
                TableOptions {
                    copy_keys: true,
                    ..TableOptions::default()
                },
            );
            for (i, key) in keys.iter().enumerate() {
                table.set(&heap, key.as_str(), i as u32);
            }
            black_box(table.key_pool_bytes());
        });
    });
}

criterion_group!(
    benches,
    bench_table_insert_1k,
    bench_table_get_10k,
    bench_table_churn,
    bench_table_string_keys,
);
criterion_main!(benches);
