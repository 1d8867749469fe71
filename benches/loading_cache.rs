//! Loading-cache benchmarks.
//!
//! Run with: `cargo bench --bench loading_cache`
//!
//! Compares the bounded cache against the pass-through cache for the
//! identifier loader, under a skewed hot set and under eviction churn.

use std::hint::black_box;
use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use probekit::cache::{BoundedCache, Cache, PassthroughCache};
use probekit::sql::{SimpleSqlNormalizer, SqlIdLoader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const QUERIES: usize = 512;
const OPS: u64 = 10_000;

fn queries() -> Vec<String> {
    (0..QUERIES)
        .map(|i| {
            format!(
                "select id, name from sample_{} where id = {i} order by id",
                i % 37
            )
        })
        .collect()
}

fn workload(len: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            // 80% of lookups hit the first 64 statements
            if rng.gen_bool(0.8) {
                rng.gen_range(0..64)
            } else {
                rng.gen_range(0..QUERIES)
            }
        })
        .collect()
}

// ============================================================================
// Identifier lookups
// ============================================================================

fn bench_identifier_lookup(c: &mut Criterion) {
    let sql = queries();
    let keys = workload(OPS as usize, 42);

    let mut group = c.benchmark_group("identifier_lookup");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("passthrough", |b| {
        let cache =
            PassthroughCache::<String, String, _>::new(SqlIdLoader::new(SimpleSqlNormalizer));
        b.iter(|| {
            for &k in &keys {
                black_box(cache.get(&sql[k]).ok());
            }
        })
    });

    group.bench_function("bounded_warm", |b| {
        let cache: BoundedCache<String, String, SqlIdLoader> =
            BoundedCache::new(SqlIdLoader::new(SimpleSqlNormalizer), Some(1024), None);
        for query in &sql {
            let _ = cache.get(query);
        }
        b.iter(|| {
            for &k in &keys {
                black_box(cache.get(&sql[k]).ok());
            }
        })
    });

    group.bench_function("bounded_ttl", |b| {
        let cache: BoundedCache<String, String, SqlIdLoader> = BoundedCache::new(
            SqlIdLoader::new(SimpleSqlNormalizer),
            Some(1024),
            Some(Duration::from_secs(60)),
        );
        b.iter(|| {
            for &k in &keys {
                black_box(cache.get(&sql[k]).ok());
            }
        })
    });

    group.finish();
}

// ============================================================================
// Eviction churn
// ============================================================================

fn bench_eviction_churn(c: &mut Criterion) {
    c.bench_function("bounded_eviction_churn", |b| {
        b.iter_batched(
            || {
                BoundedCache::new(
                    |key: &u64| Ok::<_, ()>(key.wrapping_mul(31)),
                    Some(64),
                    None,
                )
            },
            |cache| {
                for i in 0..4_096u64 {
                    let _ = black_box(cache.get(&black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_identifier_lookup, bench_eviction_churn);
criterion_main!(benches);
