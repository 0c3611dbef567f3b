use std::sync::{Arc, Weak};

use crate::stats::EntryStats;
use crate::weak_map::KeyId;

/// Result of the single memoized-function invocation that produced an
/// entry.
///
/// `Error` arms exist only in caches built with
/// [`CacheOptions::cache_error`](crate::CacheOptions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V, E> {
	/// The function returned a value.
	Value(V),
	/// The function failed and the failure was captured.
	Error(E),
}

impl<V, E> Outcome<V, E> {
	/// Returns the value, if this outcome holds one.
	pub fn value(&self) -> Option<&V> {
		match self {
			Outcome::Value(v) => Some(v),
			Outcome::Error(_) => None,
		}
	}

	/// Returns the captured error, if this outcome holds one.
	pub fn error(&self) -> Option<&E> {
		match self {
			Outcome::Value(_) => None,
			Outcome::Error(e) => Some(e),
		}
	}
}

/// One memoized result: a non-owning key handle, the produced outcome, and
/// the per-entry statistics.
///
/// Entries are shared between the weak map and the entry set via `Arc`; the
/// entry set's strong reference is what keeps the metadata alive once the
/// key itself has been dropped.
pub(crate) struct Entry<K, V, E> {
	key: Weak<K>,
	key_id: KeyId,
	outcome: Outcome<V, E>,
	stats: EntryStats,
	/// Insertion sequence number; the deterministic ranking tiebreak.
	seq: u64,
}

impl<K, V, E> Entry<K, V, E> {
	pub(crate) fn new(key: &Arc<K>, outcome: Outcome<V, E>, stats: EntryStats, seq: u64) -> Self {
		Self {
			key: Arc::downgrade(key),
			key_id: KeyId::of(key),
			outcome,
			stats,
			seq,
		}
	}

	/// The strong key, if the outside world still holds it.
	pub(crate) fn upgrade_key(&self) -> Option<Arc<K>> {
		self.key.upgrade()
	}

	/// True once the key is no longer reachable from outside the cache.
	pub(crate) fn is_stale(&self) -> bool {
		self.key.strong_count() == 0
	}

	pub(crate) fn key_id(&self) -> KeyId {
		self.key_id
	}

	pub(crate) fn outcome(&self) -> &Outcome<V, E> {
		&self.outcome
	}

	pub(crate) fn stats(&self) -> &EntryStats {
		&self.stats
	}

	pub(crate) fn seq(&self) -> u64 {
		self.seq
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_entry(key: &Arc<u64>, seq: u64) -> Entry<u64, u64, String> {
		Entry::new(key, Outcome::Value(**key * 2), EntryStats::new(0, 0), seq)
	}

	#[test]
	fn test_entry_does_not_keep_key_alive() {
		let key = Arc::new(7u64);
		let entry = make_entry(&key, 0);

		assert!(!entry.is_stale());
		assert!(entry.upgrade_key().is_some());

		drop(key);
		assert!(entry.is_stale());
		assert!(entry.upgrade_key().is_none());
	}

	#[test]
	fn test_upgraded_key_is_the_original() {
		let key = Arc::new(7u64);
		let entry = make_entry(&key, 0);

		let upgraded = entry.upgrade_key().unwrap();
		assert!(Arc::ptr_eq(&upgraded, &key));
		assert_eq!(entry.key_id(), KeyId::of(&key));
	}

	#[test]
	fn test_outcome_accessors() {
		let value: Outcome<u64, String> = Outcome::Value(42);
		assert_eq!(value.value(), Some(&42));
		assert_eq!(value.error(), None);

		let error: Outcome<u64, String> = Outcome::Error("boom".to_string());
		assert_eq!(error.value(), None);
		assert_eq!(error.error().map(String::as_str), Some("boom"));
	}
}
