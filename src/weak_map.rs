use std::collections::HashMap;
use std::sync::{Arc, Weak};

use ahash::RandomState;
use parking_lot::Mutex;

/// Reference identity of an `Arc`-held key: its allocation address.
///
/// Every mapping (and every entry) holds a `Weak` to its key, which pins
/// the allocation, so a live id can never be reused by a different key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct KeyId(usize);

impl KeyId {
	pub(crate) fn of<K>(key: &Arc<K>) -> Self {
		Self(Arc::as_ptr(key) as usize)
	}
}

struct Slot<K, T> {
	key: Weak<K>,
	value: T,
}

/// Mapping keyed by reference identity with weak key retention.
///
/// The internal lock is never held while a producer runs: the producer
/// invokes the memoized function and takes the cache write lock to
/// register the entry, and holding both locks would invite deadlock.
/// Callers serialize producers; when two producers for the same key do
/// race, the last install wins.
pub(crate) struct WeakKeyMap<K, T> {
	slots: Mutex<HashMap<KeyId, Slot<K, T>, RandomState>>,
}

impl<K, T: Clone> WeakKeyMap<K, T> {
	pub(crate) fn new() -> Self {
		Self {
			slots: Mutex::new(HashMap::default()),
		}
	}

	/// Look up the live mapping for `key`, or install the producer's value.
	///
	/// Returns the mapped value and whether it was already present. A
	/// mapping whose key died is treated as absent and dropped on sight.
	pub(crate) fn get_or_add<F, Er>(&self, key: &Arc<K>, produce: F) -> Result<(T, bool), Er>
	where
		F: FnOnce() -> Result<T, Er>,
	{
		let id = KeyId::of(key);
		{
			let mut slots = self.slots.lock();
			if let Some(slot) = slots.get(&id) {
				match slot.key.upgrade() {
					Some(live) if Arc::ptr_eq(&live, key) => {
						return Ok((slot.value.clone(), true));
					}
					// The stored key died; the mapping is stale.
					_ => {
						slots.remove(&id);
					}
				}
			}
		}

		let value = produce()?;

		let mut slots = self.slots.lock();
		slots.insert(
			id,
			Slot {
				key: Arc::downgrade(key),
				value: value.clone(),
			},
		);
		Ok((value, false))
	}

	/// True if a live mapping exists for `key`.
	pub(crate) fn contains(&self, key: &Arc<K>) -> bool {
		let slots = self.slots.lock();
		match slots.get(&KeyId::of(key)) {
			Some(slot) => slot.key.upgrade().is_some_and(|live| Arc::ptr_eq(&live, key)),
			None => false,
		}
	}

	/// Erase the mapping with the given identity, if any.
	pub(crate) fn remove(&self, id: KeyId) {
		self.slots.lock().remove(&id);
	}

	pub(crate) fn clear(&self) {
		self.slots.lock().clear();
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.slots.lock().len()
	}
}
