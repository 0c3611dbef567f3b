use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;

use crate::entry::Entry;
use crate::stats::StatsSnapshot;

/// Strong-reference registry of all live entries.
///
/// Ownership here is what keeps entry metadata (and the weak key handle)
/// alive independent of the weak map's reclamation state, which is what
/// lets trim drive cleanup. Mutation is serialized by the cache write
/// lock; this type is not synchronized on its own.
pub(crate) struct EntrySet<K, V, E> {
	entries: HashMap<u64, Arc<Entry<K, V, E>>, RandomState>,
}

impl<K, V, E> EntrySet<K, V, E> {
	pub(crate) fn new() -> Self {
		Self {
			entries: HashMap::default(),
		}
	}

	pub(crate) fn insert(&mut self, entry: Arc<Entry<K, V, E>>) {
		self.entries.insert(entry.seq(), entry);
	}

	pub(crate) fn remove(&mut self, seq: u64) -> Option<Arc<Entry<K, V, E>>> {
		self.entries.remove(&seq)
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	pub(crate) fn clear(&mut self) {
		self.entries.clear();
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Entry<K, V, E>>> {
		self.entries.values()
	}

	/// Build the eviction order for one trim pass.
	///
	/// Candidates are the `shield` oldest entries by creation stamp, ranked
	/// by the caller metric (ascending unless `descending`), ties broken by
	/// creation stamp and then insertion sequence. Rebuilt on every call;
	/// statistics move between trims and a cached order would rank on stale
	/// numbers.
	pub(crate) fn eviction_candidates(
		&self,
		shield: usize,
		ranker: &dyn Fn(&StatsSnapshot) -> f64,
		descending: bool,
	) -> Vec<Arc<Entry<K, V, E>>> {
		let mut by_age: Vec<&Arc<Entry<K, V, E>>> = self.entries.values().collect();
		by_age.sort_by_key(|entry| (entry.stats().creation_ticks(), entry.seq()));
		by_age.truncate(shield);

		let mut ranked: Vec<(f64, u64, u64, Arc<Entry<K, V, E>>)> = by_age
			.into_iter()
			.map(|entry| {
				let score = ranker(&entry.stats().snapshot());
				(score, entry.stats().creation_ticks(), entry.seq(), entry.clone())
			})
			.collect();

		ranked.sort_by(|a, b| {
			let by_score = if descending {
				b.0.total_cmp(&a.0)
			} else {
				a.0.total_cmp(&b.0)
			};
			by_score.then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2))
		});

		ranked.into_iter().map(|(_, _, _, entry)| entry).collect()
	}
}
