use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-entry counters and timestamps.
///
/// Mutable fields are independent atomics: a reader never sees a torn
/// field, and the ranker tolerates approximate consistency across fields.
/// Creation and invocation stamps are fixed at construction.
pub(crate) struct EntryStats {
	/// Lookups served by this entry, the producing call included.
	hit_count: AtomicU64,
	/// Accumulated lookup cost in ticks across all hits.
	total_lookup_ticks: AtomicU64,
	/// Tick stamp of the most recent hit.
	last_access_ticks: AtomicU64,
	/// Tick stamp of the producing call.
	creation_ticks: u64,
	/// Cost in ticks of the single function invocation that produced the
	/// entry.
	invoke_ticks: u64,
}

impl EntryStats {
	/// Create stats for a freshly produced entry.
	///
	/// `hit_count` starts at zero; the producing call records its own hit,
	/// which is what brings a newborn entry to one.
	pub(crate) fn new(creation_ticks: u64, invoke_ticks: u64) -> Self {
		Self {
			hit_count: AtomicU64::new(0),
			total_lookup_ticks: AtomicU64::new(0),
			last_access_ticks: AtomicU64::new(creation_ticks),
			creation_ticks,
			invoke_ticks,
		}
	}

	/// Record one served lookup: bump the hit count, accumulate the lookup
	/// cost, refresh the last-access stamp.
	pub(crate) fn record_hit(&self, lookup_ticks: u64, access_ticks: u64) {
		self.hit_count.fetch_add(1, Ordering::Release);
		self.total_lookup_ticks.fetch_add(lookup_ticks, Ordering::Release);
		self.last_access_ticks.store(access_ticks, Ordering::Release);
	}

	pub(crate) fn creation_ticks(&self) -> u64 {
		self.creation_ticks
	}

	/// Point-in-time view for the ranker and the stats trim view.
	pub(crate) fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			hit_count: self.hit_count.load(Ordering::Acquire),
			total_lookup: Duration::from_nanos(self.total_lookup_ticks.load(Ordering::Acquire)),
			last_access_ticks: self.last_access_ticks.load(Ordering::Acquire),
			creation_ticks: self.creation_ticks,
			invoke_cost: Duration::from_nanos(self.invoke_ticks),
		}
	}
}

/// Point-in-time view of one entry's statistics.
///
/// Handed to the eviction ranker and to
/// [`trim_stats`](crate::Cache::trim_stats) predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
	/// Number of times `get_or_add` served this entry, the producing call
	/// included.
	pub hit_count: u64,
	/// Accumulated lookup cost across all hits.
	pub total_lookup: Duration,
	/// Tick stamp of the most recent hit.
	pub last_access_ticks: u64,
	/// Tick stamp of the producing call.
	pub creation_ticks: u64,
	/// Cost of the single function invocation that produced the entry.
	pub invoke_cost: Duration,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_newborn_snapshot() {
		let stats = EntryStats::new(100, 25);
		let snap = stats.snapshot();

		assert_eq!(snap.hit_count, 0);
		assert_eq!(snap.total_lookup, Duration::ZERO);
		assert_eq!(snap.last_access_ticks, 100);
		assert_eq!(snap.creation_ticks, 100);
		assert_eq!(snap.invoke_cost, Duration::from_nanos(25));
	}

	#[test]
	fn test_record_hit_updates_all_fields() {
		let stats = EntryStats::new(100, 25);

		stats.record_hit(5, 110);
		stats.record_hit(7, 130);

		let snap = stats.snapshot();
		assert_eq!(snap.hit_count, 2);
		assert_eq!(snap.total_lookup, Duration::from_nanos(12));
		assert_eq!(snap.last_access_ticks, 130);
	}

	#[test]
	fn test_creation_never_exceeds_last_access() {
		let stats = EntryStats::new(50, 10);
		assert_eq!(stats.snapshot().last_access_ticks, 50);

		stats.record_hit(1, 51);
		let snap = stats.snapshot();
		assert!(snap.creation_ticks <= snap.last_access_ticks);
	}

	#[test]
	fn test_concurrent_hits_are_not_lost() {
		use std::sync::Arc;
		use std::thread;

		let stats = Arc::new(EntryStats::new(0, 0));
		let handles: Vec<_> = (0..4u64)
			.map(|t| {
				let stats = stats.clone();
				thread::spawn(move || {
					for i in 0..250 {
						stats.record_hit(1, t * 1000 + i);
					}
				})
			})
			.collect();

		for handle in handles {
			handle.join().unwrap();
		}

		let snap = stats.snapshot();
		assert_eq!(snap.hit_count, 1000);
		assert_eq!(snap.total_lookup, Duration::from_nanos(1000));
	}
}
