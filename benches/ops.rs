//! Micro-operation benchmarks for the shipped invalidation policies.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency (nanoseconds) for get and insert
//! operations across LRU, MRU, and smallest-value invalidation under
//! identical geometry.

use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use waycache::cache::SetAssociativeCache;
use waycache::policy::{MruInvalidator, SmallestValueInvalidator};

const SETS: usize = 1024;
const WAYS: usize = 16;
const OPS: u64 = 100_000;

// ============================================================================
// Get Hit Latency (ns/op)
// ============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    // LRU
    group.bench_function("lru", |b| {
        b.iter_custom(|iters| {
            let mut cache = SetAssociativeCache::new(SETS, WAYS).unwrap();
            for i in 0..(SETS * WAYS) as u64 {
                cache.insert(i, i).unwrap();
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (SETS * WAYS) as u64;
                    black_box(cache.get(&key));
                }
            }
            start.elapsed()
        })
    });

    // MRU
    group.bench_function("mru", |b| {
        b.iter_custom(|iters| {
            let mut cache =
                SetAssociativeCache::with_invalidator(SETS, WAYS, MruInvalidator::new).unwrap();
            for i in 0..(SETS * WAYS) as u64 {
                cache.insert(i, i).unwrap();
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (SETS * WAYS) as u64;
                    black_box(cache.get(&key));
                }
            }
            start.elapsed()
        })
    });

    // Smallest-value
    group.bench_function("smallest_value", |b| {
        b.iter_custom(|iters| {
            let mut cache =
                SetAssociativeCache::with_invalidator(SETS, WAYS, SmallestValueInvalidator::new)
                    .unwrap();
            for i in 0..(SETS * WAYS) as u64 {
                cache.insert(i, i).unwrap();
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (SETS * WAYS) as u64;
                    black_box(cache.get(&key));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Insert-with-Eviction Latency (ns/op)
// ============================================================================

fn bench_insert_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_evict_ns");
    group.throughput(Throughput::Elements(OPS));

    // LRU
    group.bench_function("lru", |b| {
        b.iter_custom(|iters| {
            let mut cache = SetAssociativeCache::new(SETS, WAYS).unwrap();
            let start = Instant::now();
            for iter in 0..iters {
                for i in 0..OPS {
                    let key = iter * OPS + i;
                    black_box(cache.insert(key, key).unwrap());
                }
            }
            start.elapsed()
        })
    });

    // MRU
    group.bench_function("mru", |b| {
        b.iter_custom(|iters| {
            let mut cache =
                SetAssociativeCache::with_invalidator(SETS, WAYS, MruInvalidator::new).unwrap();
            let start = Instant::now();
            for iter in 0..iters {
                for i in 0..OPS {
                    let key = iter * OPS + i;
                    black_box(cache.insert(key, key).unwrap());
                }
            }
            start.elapsed()
        })
    });

    // Smallest-value
    group.bench_function("smallest_value", |b| {
        b.iter_custom(|iters| {
            let mut cache =
                SetAssociativeCache::with_invalidator(SETS, WAYS, SmallestValueInvalidator::new)
                    .unwrap();
            let start = Instant::now();
            for iter in 0..iters {
                for i in 0..OPS {
                    let key = iter * OPS + i;
                    black_box(cache.insert(key, key).unwrap());
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_insert_evict);
criterion_main!(benches);
