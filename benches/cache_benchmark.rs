use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ranked_memo::{Cache, CacheFactory, StatsSnapshot};

fn hit_ranker(s: &StatsSnapshot) -> f64 {
	s.hit_count as f64
}

fn make_cache(max_capacity: usize) -> Cache<u64, u64, String> {
	CacheFactory::try_new(hit_ranker, max_capacity, 0.5, false)
		.unwrap()
		.create_cache(|n: &u64| Ok::<_, String>(n.wrapping_mul(2654435761)))
}

fn bench_miss(c: &mut Criterion) {
	let mut group = c.benchmark_group("miss");

	for size in [100, 1000, 10000] {
		group.throughput(Throughput::Elements(size as u64));
		group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
			b.iter(|| {
				let cache = make_cache(size * 2);
				let keys: Vec<Arc<u64>> = (0..size as u64).map(Arc::new).collect();
				for key in &keys {
					black_box(cache.get_or_add(key).unwrap());
				}
			});
		});
	}

	group.finish();
}

fn bench_hit(c: &mut Criterion) {
	let cache = make_cache(2048);
	let keys: Vec<Arc<u64>> = (0..1000u64).map(Arc::new).collect();
	for key in &keys {
		cache.get_or_add(key).unwrap();
	}

	c.bench_function("hit", |b| {
		b.iter(|| {
			for key in &keys {
				black_box(cache.get_or_add(key).unwrap());
			}
		});
	});
}

fn bench_eviction_churn(c: &mut Criterion) {
	// Every insert beyond capacity runs a full trim pass.
	let mut group = c.benchmark_group("eviction_churn");

	for capacity in [64, 512] {
		group.bench_with_input(
			BenchmarkId::from_parameter(capacity),
			&capacity,
			|b, &capacity| {
				b.iter(|| {
					let cache = make_cache(capacity);
					let keys: Vec<Arc<u64>> =
						(0..capacity as u64 * 4).map(Arc::new).collect();
					for key in &keys {
						black_box(cache.get_or_add(key).unwrap());
					}
				});
			},
		);
	}

	group.finish();
}

fn bench_concurrent_hits(c: &mut Criterion) {
	let cache = Arc::new(make_cache(2048));
	let keys: Arc<Vec<Arc<u64>>> = Arc::new((0..1000u64).map(Arc::new).collect());
	for key in keys.iter() {
		cache.get_or_add(key).unwrap();
	}

	c.bench_function("concurrent_hits_4_threads", |b| {
		b.iter(|| {
			let handles: Vec<_> = (0..4usize)
				.map(|t| {
					let cache = cache.clone();
					let keys = keys.clone();
					thread::spawn(move || {
						for i in 0..250usize {
							let key = &keys[(t * 31 + i) % keys.len()];
							black_box(cache.get_or_add(key).unwrap());
						}
					})
				})
				.collect();
			for handle in handles {
				handle.join().unwrap();
			}
		});
	});
}

criterion_group!(
	benches,
	bench_miss,
	bench_hit,
	bench_eviction_churn,
	bench_concurrent_hits
);
criterion_main!(benches);
