use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::builder::{CacheFactory, CacheOptions, Ranker};
use crate::clock::Clock;
use crate::entry::{Entry, Outcome};
use crate::entry_set::EntrySet;
use crate::error::CacheError;
use crate::metrics::CacheMetrics;
use crate::stats::{EntryStats, StatsSnapshot};
use crate::weak_map::{KeyId, WeakKeyMap};

type MemoFn<K, V, E> = Box<dyn Fn(&K) -> Result<V, E> + Send + Sync>;

/// Weak-keyed memoization cache with ranked, age-guarded eviction.
///
/// Wraps a function `f` and remembers computed results per key, where a
/// key is an `Arc` compared by reference identity, not by value. Entries
/// never keep their key alive: once the outside world drops its last
/// strong handle, the entry becomes reclaimable.
///
/// When the cache reaches capacity, the next insertion trims it. Only the
/// oldest `max_capacity * age_threshold` entries are eviction candidates
/// (the age shield keeps a burst of fresh inserts from thrashing each
/// other out); within the candidates, the caller-supplied ranker orders
/// victims.
///
/// The cache can be shared across threads via `Arc<Cache>`. All methods
/// are synchronous; lookups hold the upgradeable-read side of the cache
/// lock, so observational reads (`count`, `contains`, `metrics`) stay
/// concurrent while mutation is single-writer.
///
/// Created through [`CacheFactory`](crate::CacheFactory).
pub struct Cache<K, V, E> {
	f: MemoFn<K, V, E>,
	ranker: Ranker,
	max_capacity: usize,
	age_threshold: f64,
	descending: bool,
	cache_error: bool,
	clock: Arc<dyn Clock>,
	weak_map: WeakKeyMap<K, Arc<Entry<K, V, E>>>,
	entries: RwLock<EntrySet<K, V, E>>,
	/// Dirty-read mirror of `entries.len()`; trim's fast path and `count`
	/// read it without taking the lock.
	entry_count: AtomicUsize,
	next_seq: AtomicU64,
	disposed: AtomicBool,
	hits: AtomicU64,
	misses: AtomicU64,
	evictions: AtomicU64,
	stale_reclaimed: AtomicU64,
	trimmed: AtomicU64,
	errors_cached: AtomicU64,
}

impl<K, V, E> Cache<K, V, E> {
	pub(crate) fn with_config(
		factory: &CacheFactory,
		f: MemoFn<K, V, E>,
		options: CacheOptions,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			f,
			ranker: factory.ranker.clone(),
			max_capacity: factory.max_capacity,
			age_threshold: factory.age_threshold,
			descending: factory.descending,
			cache_error: options.cache_error,
			clock,
			weak_map: WeakKeyMap::new(),
			entries: RwLock::new(EntrySet::new()),
			entry_count: AtomicUsize::new(0),
			next_seq: AtomicU64::new(0),
			disposed: AtomicBool::new(false),
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
			evictions: AtomicU64::new(0),
			stale_reclaimed: AtomicU64::new(0),
			trimmed: AtomicU64::new(0),
			errors_cached: AtomicU64::new(0),
		}
	}

	/// Return the memoized result for `key`, running the wrapped function
	/// on the first lookup.
	///
	/// On a miss the cache is trimmed first, then the function runs and its
	/// outcome is installed. A failure is propagated to the caller; with
	/// error caching enabled it is also stored and served to every later
	/// lookup of the same key until eviction.
	pub fn get_or_add(&self, key: &Arc<K>) -> Result<V, CacheError<E>>
	where
		V: Clone,
		E: Clone,
	{
		if self.disposed.load(Ordering::Acquire) {
			return Err(CacheError::Disposed);
		}

		let mut gate = self.entries.upgradable_read();
		// A dispose may have won the lock between the check above and the
		// acquisition.
		if self.disposed.load(Ordering::Acquire) {
			return Err(CacheError::Disposed);
		}
		let lookup_start = self.clock.elapsed_ticks();

		let result = self.weak_map.get_or_add(key, || {
			self.trim_locked(&mut gate);

			let invoke_start = self.clock.elapsed_ticks();
			let outcome = match (self.f)(key) {
				Ok(value) => Outcome::Value(value),
				Err(error) if self.cache_error => {
					self.errors_cached.fetch_add(1, Ordering::Relaxed);
					Outcome::Error(error)
				}
				Err(error) => return Err(CacheError::Computation(error)),
			};
			let now = self.clock.elapsed_ticks();

			let stats = EntryStats::new(now, now.saturating_sub(invoke_start));
			let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
			let entry = Arc::new(Entry::new(key, outcome, stats, seq));

			gate.with_upgraded(|set| set.insert(entry.clone()));
			self.entry_count.fetch_add(1, Ordering::Release);
			Ok(entry)
		});

		let (entry, was_hit) = match result {
			Ok(found) => found,
			Err(error) => {
				// Nothing was cached; the failure is the caller's alone.
				self.misses.fetch_add(1, Ordering::Relaxed);
				return Err(error);
			}
		};

		if was_hit {
			self.hits.fetch_add(1, Ordering::Relaxed);
		} else {
			self.misses.fetch_add(1, Ordering::Relaxed);
		}

		let now = self.clock.elapsed_ticks();
		entry
			.stats()
			.record_hit(now.saturating_sub(lookup_start), now);
		drop(gate);

		match entry.outcome() {
			Outcome::Value(value) => Ok(value.clone()),
			Outcome::Error(error) => Err(CacheError::Computation(error.clone())),
		}
	}

	/// Number of entries, stale ones included until the next trim sweeps
	/// them.
	pub fn count(&self) -> usize {
		self.entry_count.load(Ordering::Acquire)
	}

	pub fn is_empty(&self) -> bool {
		self.count() == 0
	}

	pub fn max_capacity(&self) -> usize {
		self.max_capacity
	}

	/// True if a live entry exists for `key`. Does not touch entry
	/// statistics.
	pub fn contains(&self, key: &Arc<K>) -> bool {
		self.weak_map.contains(key)
	}

	/// Snapshot of the cache debug counters.
	pub fn metrics(&self) -> CacheMetrics {
		CacheMetrics {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			evictions: self.evictions.load(Ordering::Relaxed),
			stale_reclaimed: self.stale_reclaimed.load(Ordering::Relaxed),
			trimmed: self.trimmed.load(Ordering::Relaxed),
			errors_cached: self.errors_cached.load(Ordering::Relaxed),
			entry_count: self.count(),
			max_capacity: self.max_capacity,
		}
	}

	/// Remove every entry and reset the debug counters.
	pub fn clear(&self) -> Result<(), CacheError<E>> {
		if self.disposed.load(Ordering::Acquire) {
			return Err(CacheError::Disposed);
		}

		let mut set = self.entries.write();
		self.weak_map.clear();
		set.clear();
		self.entry_count.store(0, Ordering::Release);
		for counter in [
			&self.hits,
			&self.misses,
			&self.evictions,
			&self.stale_reclaimed,
			&self.trimmed,
			&self.errors_cached,
		] {
			counter.store(0, Ordering::Relaxed);
		}
		Ok(())
	}

	/// Tear the cache down.
	///
	/// Fails with [`CacheError::InUse`] instead of blocking when another
	/// thread holds the cache lock; the caller may retry. After a
	/// successful dispose every operation fails with
	/// [`CacheError::Disposed`].
	pub fn dispose(&self) -> Result<(), CacheError<E>> {
		let Some(mut set) = self.entries.try_write() else {
			return Err(CacheError::InUse);
		};
		if self.disposed.swap(true, Ordering::AcqRel) {
			return Err(CacheError::Disposed);
		}

		self.weak_map.clear();
		set.clear();
		self.entry_count.store(0, Ordering::Release);
		Ok(())
	}

	/// Remove every value entry selected by `pred`, plus every entry whose
	/// key has died. Returns the number of entries removed.
	///
	/// Cached error outcomes are never selected by this view; use
	/// [`trim_outcomes`](Cache::trim_outcomes) for those.
	pub fn trim_values(&self, mut pred: impl FnMut(&K, &V) -> bool) -> Result<usize, CacheError<E>> {
		self.trim_where(|key, entry| match entry.outcome() {
			Outcome::Value(value) => pred(key.as_ref(), value),
			Outcome::Error(_) => false,
		})
	}

	/// Remove every entry whose full outcome is selected by `pred`, plus
	/// every entry whose key has died. Returns the number of entries
	/// removed.
	///
	/// Only available on caches built with
	/// [`CacheOptions::cache_error`](crate::CacheOptions).
	pub fn trim_outcomes(
		&self,
		mut pred: impl FnMut(&K, &Outcome<V, E>) -> bool,
	) -> Result<usize, CacheError<E>> {
		if !self.cache_error {
			return Err(CacheError::ErrorCachingDisabled);
		}
		self.trim_where(|key, entry| pred(key.as_ref(), entry.outcome()))
	}

	/// Remove every entry whose statistics are selected by `pred`, plus
	/// every entry whose key has died. Returns the number of entries
	/// removed.
	pub fn trim_stats(
		&self,
		mut pred: impl FnMut(&StatsSnapshot) -> bool,
	) -> Result<usize, CacheError<E>> {
		self.trim_where(|_, entry| pred(&entry.stats().snapshot()))
	}

	fn trim_where(
		&self,
		mut pred: impl FnMut(&Arc<K>, &Arc<Entry<K, V, E>>) -> bool,
	) -> Result<usize, CacheError<E>> {
		if self.disposed.load(Ordering::Acquire) {
			return Err(CacheError::Disposed);
		}

		let mut set = self.entries.write();
		let victims: Vec<(u64, KeyId, bool)> = set
			.iter()
			.filter_map(|entry| match entry.upgrade_key() {
				Some(key) => {
					pred(&key, entry).then(|| (entry.seq(), entry.key_id(), false))
				}
				// Dead keys are reclaimed regardless of the predicate.
				None => Some((entry.seq(), entry.key_id(), true)),
			})
			.collect();

		for (seq, key_id, stale) in &victims {
			self.weak_map.remove(*key_id);
			set.remove(*seq);
			if *stale {
				self.stale_reclaimed.fetch_add(1, Ordering::Relaxed);
			} else {
				self.trimmed.fetch_add(1, Ordering::Relaxed);
			}
		}
		self.entry_count.store(set.len(), Ordering::Release);
		Ok(victims.len())
	}

	/// Enforce capacity before an insert, upgrading the caller's lock for
	/// the duration of the sweep.
	///
	/// Stale entries go first and never charge the eviction budget; then
	/// ranked victims are evicted until the set is back under capacity.
	fn trim_locked(&self, gate: &mut RwLockUpgradableReadGuard<'_, EntrySet<K, V, E>>) {
		// Dirty read: concurrent inserts may each pass this check, so the
		// set can transiently exceed capacity by the number of in-flight
		// inserts. The next trim restores the invariant.
		if self.entry_count.load(Ordering::Acquire) < self.max_capacity {
			return;
		}

		gate.with_upgraded(|set| {
			let stale: Vec<(u64, KeyId)> = set
				.iter()
				.filter(|entry| entry.is_stale())
				.map(|entry| (entry.seq(), entry.key_id()))
				.collect();
			for (seq, key_id) in stale {
				self.weak_map.remove(key_id);
				set.remove(seq);
				self.stale_reclaimed.fetch_add(1, Ordering::Relaxed);
			}

			if set.len() >= self.max_capacity {
				let candidates = set.eviction_candidates(
					self.age_shield(),
					self.ranker.as_ref(),
					self.descending,
				);
				for victim in candidates {
					if set.len() < self.max_capacity {
						break;
					}
					self.weak_map.remove(victim.key_id());
					set.remove(victim.seq());
					self.evictions.fetch_add(1, Ordering::Relaxed);
				}
			}

			self.entry_count.store(set.len(), Ordering::Release);
		});
	}

	/// Size of the eviction candidate set: the oldest
	/// `max_capacity * age_threshold` entries, never fewer than one.
	fn age_shield(&self) -> usize {
		((self.max_capacity as f64 * self.age_threshold) as usize).max(1)
	}
}
