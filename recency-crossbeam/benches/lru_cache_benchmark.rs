//! Benchmark for ConcurrentLruCache with epoch-based memory reclamation.
//!
//! Run with: cargo bench --package recency-crossbeam --bench lru_cache_benchmark

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use mimalloc::MiMalloc;
use rand::Rng;
use std::sync::Arc;
use std::thread;

use recency_crossbeam::EpochLruCache;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const CAPACITY: usize = 128;

// ============================================================================
// Concurrent insert benchmark (every set past capacity evicts)
// ============================================================================

fn lru_cache_insert(thread_count: usize, iteration_count: usize) {
    let cache: Arc<EpochLruCache<usize, String>> = Arc::new(EpochLruCache::new(CAPACITY).unwrap());
    let mut handles = vec![];

    for i in 0..thread_count {
        let cache_clone = Arc::clone(&cache);
        let handle = thread::spawn(move || {
            for j in 0..iteration_count {
                let key = i * iteration_count + j;
                cache_clone.set(key, format!("value_{}", key));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.size() <= CAPACITY);
}

// ============================================================================
// Skewed read-mostly benchmark (hot keys promoted, cold keys evicted)
// ============================================================================

fn lru_cache_skewed(thread_count: usize, iteration_count: usize) {
    let cache: Arc<EpochLruCache<usize, String>> = Arc::new(EpochLruCache::new(CAPACITY).unwrap());
    let mut handles = vec![];

    for _ in 0..thread_count {
        let cache_clone = Arc::clone(&cache);
        let handle = thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for _ in 0..iteration_count {
                // 90% of lookups go to a hot set a quarter of the capacity
                let key = if rng.gen_bool(0.9) {
                    rng.gen_range(0..CAPACITY / 4)
                } else {
                    rng.gen_range(0..CAPACITY * 16)
                };

                if cache_clone.get(&key).is_none() {
                    cache_clone.set(key, format!("value_{}", key));
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// High contention benchmark (few keys, constant promotion)
// ============================================================================

fn lru_cache_contention(thread_count: usize, iteration_count: usize) {
    let cache: Arc<EpochLruCache<usize, String>> = Arc::new(EpochLruCache::new(8).unwrap());
    let key_range = 16usize;

    let mut handles = vec![];

    for _ in 0..thread_count {
        let cache_clone = Arc::clone(&cache);
        let handle = thread::spawn(move || {
            for i in 0..iteration_count {
                let key = i % key_range;
                if i % 2 == 0 {
                    cache_clone.set(key, format!("value_{}", i));
                } else {
                    let _ = cache_clone.get(&key);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Criterion benchmark groups
// ============================================================================

fn concurrent_insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_cache_concurrent_insert");

    for thread_count in [1, 2, 4, 8, 12, 16] {
        let bench_name = format!("concurrent_lru_cache_{:0>2}_10000", thread_count);
        group.bench_function(bench_name, |b| {
            b.iter(|| lru_cache_insert(black_box(thread_count), black_box(10_000)))
        });
    }

    group.finish();
}

fn skewed_workload_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_cache_skewed_workload");

    for thread_count in [1, 2, 4, 8, 12, 16] {
        let bench_name = format!("concurrent_lru_cache_{:0>2}_10000", thread_count);
        group.bench_function(bench_name, |b| {
            b.iter(|| lru_cache_skewed(black_box(thread_count), black_box(10_000)))
        });
    }

    group.finish();
}

fn contention_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_cache_high_contention");

    for thread_count in [1, 2, 4, 8, 12, 16] {
        let bench_name = format!("concurrent_lru_cache_{:0>2}_10000", thread_count);
        group.bench_function(bench_name, |b| {
            b.iter(|| lru_cache_contention(black_box(thread_count), black_box(10_000)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    concurrent_insert_benchmark,
    skewed_workload_benchmark,
    contention_benchmark
);
criterion_main!(benches);
