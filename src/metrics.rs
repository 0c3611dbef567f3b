//! Cache debug counters.

/// Point-in-time counters for one cache.
///
/// # Example
///
/// ```
/// use ranked_memo::CacheFactory;
///
/// let factory = CacheFactory::try_new(|s| s.hit_count as f64, 8, 0.5, false).unwrap();
/// let cache = factory.create_cache(|n: &u64| Ok::<_, String>(n * 2));
/// // ... perform cache operations ...
///
/// let metrics = cache.metrics();
/// println!("Hit rate: {:.2}%", metrics.hit_rate() * 100.0);
/// println!("Evictions: {}", metrics.evictions);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
	/// Lookups served from an existing entry.
	pub hits: u64,
	/// Lookups that ran the memoized function.
	pub misses: u64,
	/// Entries removed by ranked capacity eviction.
	pub evictions: u64,
	/// Entries reclaimed because their key was dropped.
	pub stale_reclaimed: u64,
	/// Entries removed by caller-driven trim views.
	pub trimmed: u64,
	/// Failures captured as cached error outcomes.
	pub errors_cached: u64,
	/// Current number of entries.
	pub entry_count: usize,
	/// Maximum entry capacity.
	pub max_capacity: usize,
}

impl CacheMetrics {
	/// Cache hit rate as a ratio between 0.0 and 1.0.
	///
	/// Returns 0.0 if there have been no lookups.
	pub fn hit_rate(&self) -> f64 {
		let total = self.hits + self.misses;
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}

	/// Fraction of capacity currently in use, between 0.0 and 1.0.
	pub fn utilization(&self) -> f64 {
		if self.max_capacity == 0 {
			0.0
		} else {
			self.entry_count as f64 / self.max_capacity as f64
		}
	}

	/// Total number of lookups (hits + misses).
	pub fn total_accesses(&self) -> u64 {
		self.hits + self.misses
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hit_rate_empty() {
		assert_eq!(CacheMetrics::default().hit_rate(), 0.0);
	}

	#[test]
	fn test_hit_rate() {
		let metrics = CacheMetrics {
			hits: 3,
			misses: 1,
			..Default::default()
		};
		assert_eq!(metrics.hit_rate(), 0.75);
		assert_eq!(metrics.total_accesses(), 4);
	}

	#[test]
	fn test_utilization() {
		let metrics = CacheMetrics {
			entry_count: 2,
			max_capacity: 8,
			..Default::default()
		};
		assert_eq!(metrics.utilization(), 0.25);
	}
}
