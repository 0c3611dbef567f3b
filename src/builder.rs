use std::sync::Arc;

use crate::cache::Cache;
use crate::clock::{Clock, MonotonicClock};
use crate::error::ConfigError;
use crate::stats::StatsSnapshot;

/// Scalar metric over entry statistics that orders eviction candidates.
///
/// Lower metric = evicted first, unless the factory was built with
/// `descending`.
pub type Ranker = Arc<dyn Fn(&StatsSnapshot) -> f64 + Send + Sync>;

/// Per-cache options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOptions {
	/// Capture `Err` outcomes and serve them from the cache until the
	/// entry is evicted. When false, failures propagate and nothing is
	/// stored.
	pub cache_error: bool,
}

/// Validated eviction configuration, reusable across caches.
///
/// A factory fixes the ranking metric, the capacity, and the age shield
/// once; every cache it creates shares them. Each cache gets a fresh
/// monotonic clock unless the factory was given one via
/// [`with_clock`](CacheFactory::with_clock).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use ranked_memo::CacheFactory;
///
/// // Evict the least-hit entries among the oldest half.
/// let factory = CacheFactory::try_new(|s| s.hit_count as f64, 128, 0.5, false).unwrap();
///
/// let lengths = factory.create_cache(|word: &String| Ok::<_, String>(word.len()));
/// let key = Arc::new("memo".to_string());
/// assert_eq!(lengths.get_or_add(&key).unwrap(), 4);
/// ```
#[derive(Clone)]
pub struct CacheFactory {
	pub(crate) ranker: Ranker,
	pub(crate) max_capacity: usize,
	pub(crate) age_threshold: f64,
	pub(crate) descending: bool,
	pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl std::fmt::Debug for CacheFactory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CacheFactory")
			.field("max_capacity", &self.max_capacity)
			.field("age_threshold", &self.age_threshold)
			.field("descending", &self.descending)
			.finish_non_exhaustive()
	}
}

impl CacheFactory {
	/// Validate and build a factory.
	///
	/// # Arguments
	///
	/// * `ranker` - metric over entry statistics; candidates are evicted in
	///   ascending metric order unless `descending`.
	/// * `max_capacity` - maximum entry count; must be greater than zero.
	/// * `age_threshold` - fraction of capacity whose oldest entries form
	///   the eviction candidate set; must be within `[0, 1]`. The youngest
	///   entries are shielded from eviction entirely.
	/// * `descending` - evict the largest metric first instead of the
	///   smallest.
	pub fn try_new(
		ranker: impl Fn(&StatsSnapshot) -> f64 + Send + Sync + 'static,
		max_capacity: usize,
		age_threshold: f64,
		descending: bool,
	) -> Result<Self, ConfigError> {
		if max_capacity == 0 {
			return Err(ConfigError::new("max_capacity must be greater than zero"));
		}
		if !(0.0..=1.0).contains(&age_threshold) {
			return Err(ConfigError::new(format!(
				"age_threshold must be within [0, 1], got {age_threshold}"
			)));
		}

		Ok(Self {
			ranker: Arc::new(ranker),
			max_capacity,
			age_threshold,
			descending,
			clock: None,
		})
	}

	/// Use `clock` for every cache this factory creates instead of a fresh
	/// monotonic clock per cache.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	/// Create a cache memoizing `f` with default [`CacheOptions`].
	pub fn create_cache<K, V, E>(
		&self,
		f: impl Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	) -> Cache<K, V, E>
	where
		K: 'static,
		V: 'static,
		E: 'static,
	{
		self.create_cache_with(f, CacheOptions::default())
	}

	/// Create a cache memoizing `f`.
	pub fn create_cache_with<K, V, E>(
		&self,
		f: impl Fn(&K) -> Result<V, E> + Send + Sync + 'static,
		options: CacheOptions,
	) -> Cache<K, V, E>
	where
		K: 'static,
		V: 'static,
		E: 'static,
	{
		let clock = self
			.clock
			.clone()
			.unwrap_or_else(|| Arc::new(MonotonicClock::start()));
		Cache::with_config(self, Box::new(f), options, clock)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;

	fn hit_ranker(s: &StatsSnapshot) -> f64 {
		s.hit_count as f64
	}

	#[test]
	fn test_zero_capacity_rejected() {
		let err = CacheFactory::try_new(hit_ranker, 0, 0.5, false).unwrap_err();
		assert!(err.message().contains("max_capacity"));
	}

	#[test]
	fn test_age_threshold_out_of_range_rejected() {
		for bad in [-0.1, 1.1, f64::NAN] {
			let err = CacheFactory::try_new(hit_ranker, 4, bad, false).unwrap_err();
			assert!(err.message().contains("age_threshold"));
		}
	}

	#[test]
	fn test_boundary_thresholds_accepted() {
		assert!(CacheFactory::try_new(hit_ranker, 4, 0.0, false).is_ok());
		assert!(CacheFactory::try_new(hit_ranker, 4, 1.0, true).is_ok());
	}

	#[test]
	fn test_factory_mints_independent_caches() {
		let factory = CacheFactory::try_new(hit_ranker, 4, 0.5, false).unwrap();

		let a = factory.create_cache(|n: &u64| Ok::<_, String>(n + 1));
		let b = factory.create_cache(|n: &u64| Ok::<_, String>(n + 2));

		let key = Arc::new(1u64);
		assert_eq!(a.get_or_add(&key).unwrap(), 2);
		assert_eq!(b.get_or_add(&key).unwrap(), 3);
		assert_eq!(a.count(), 1);
		assert_eq!(b.count(), 1);
	}

	#[test]
	fn test_shared_clock_is_used() {
		let clock = Arc::new(ManualClock::new());
		let factory = CacheFactory::try_new(|s| s.last_access_ticks as f64, 4, 1.0, false)
			.unwrap()
			.with_clock(clock.clone());

		let cache = factory.create_cache(|n: &u64| Ok::<_, String>(*n));
		clock.advance(100);

		let key = Arc::new(1u64);
		cache.get_or_add(&key).unwrap();

		// The entry must carry the shared clock's stamp.
		let trimmed = cache
			.trim_stats(|s| {
				assert_eq!(s.creation_ticks, 100);
				false
			})
			.unwrap();
		assert_eq!(trimmed, 0);
	}
}
