use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use crossbeam_queue::SegQueue;
use parking_lot::RwLock;

use crate::error::SubjectError;

/// Receives values fanned out by a [`Subject`].
pub trait Observer<T, E>: Send + Sync {
	fn on_next(&self, value: &T);
	fn on_error(&self, error: &E);
	fn on_completed(&self);
}

const ACTIVE: u8 = 0;
/// A terminal event was emitted; further emissions are silently dropped.
const STOPPED: u8 = 1;
const DISPOSED: u8 = 2;

struct Sink<T, E> {
	id: u64,
	observer: Arc<dyn Observer<T, E>>,
	retired: Arc<AtomicBool>,
}

impl<T, E> Clone for Sink<T, E> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			observer: self.observer.clone(),
			retired: self.retired.clone(),
		}
	}
}

struct Core<T, E> {
	/// Registration-ordered sink list. Dispatch snapshots it under the
	/// read lock and delivers outside it.
	sinks: RwLock<Vec<Sink<T, E>>>,
	/// Retired subscription ids, applied to the sink list on the next
	/// emission or subscribe (lock-free handoff from `Subscription`).
	retired: Arc<SegQueue<u64>>,
	next_id: AtomicU64,
	state: AtomicU8,
}

impl<T, E> Core<T, E> {
	fn live(&self) -> Result<(), SubjectError> {
		if self.state.load(Ordering::Acquire) == DISPOSED {
			Err(SubjectError::Disposed)
		} else {
			Ok(())
		}
	}

	/// Apply queued retirements. Skipped without blocking when a dispatch
	/// already holds the list; the queue keeps the ids for the next call.
	fn drain_retired(&self) {
		if self.retired.is_empty() {
			return;
		}
		if let Some(mut sinks) = self.sinks.try_write() {
			while let Some(id) = self.retired.pop() {
				sinks.retain(|sink| sink.id != id);
			}
		}
	}

	fn dispatch(&self, deliver: impl Fn(&dyn Observer<T, E>)) -> Result<(), SubjectError> {
		self.live()?;
		if self.state.load(Ordering::Acquire) == STOPPED {
			return Ok(());
		}
		self.drain_retired();

		let snapshot: Vec<Sink<T, E>> = self.sinks.read().clone();
		for sink in &snapshot {
			// A sink disposed mid-dispatch stops receiving immediately,
			// even before the retirement is applied to the list.
			if sink.retired.load(Ordering::Acquire) {
				continue;
			}
			deliver(sink.observer.as_ref());
		}
		Ok(())
	}
}

/// Single producer endpoint fanning values out to an evolving set of
/// sinks.
///
/// Subscribing registers a sink for every **subsequent** emission;
/// disposing the returned [`Subscription`] stops delivery. Dispatch walks
/// a point-in-time snapshot of the sink list in registration order, so
/// concurrent subscribes and disposes never crash a delivery, never
/// double-deliver, and never skip a sink that was registered for the full
/// duration of the call.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use ranked_memo::{Observer, Subject};
///
/// struct Recorder(Mutex<Vec<u32>>);
///
/// impl Observer<u32, String> for Recorder {
/// 	fn on_next(&self, value: &u32) {
/// 		self.0.lock().unwrap().push(*value);
/// 	}
/// 	fn on_error(&self, _error: &String) {}
/// 	fn on_completed(&self) {}
/// }
///
/// let subject: Subject<u32, String> = Subject::new();
/// let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
///
/// let subscription = subject.subscribe(recorder.clone()).unwrap();
/// subject.producer().on_next(1).unwrap();
/// subscription.dispose();
/// subject.producer().on_next(2).unwrap();
///
/// assert_eq!(*recorder.0.lock().unwrap(), vec![1]);
/// ```
pub struct Subject<T, E> {
	core: Arc<Core<T, E>>,
	producer: Producer<T, E>,
}

impl<T, E> Subject<T, E> {
	pub fn new() -> Self {
		let core = Arc::new(Core {
			sinks: RwLock::new(Vec::new()),
			retired: Arc::new(SegQueue::new()),
			next_id: AtomicU64::new(0),
			state: AtomicU8::new(ACTIVE),
		});
		Self {
			producer: Producer { core: core.clone() },
			core,
		}
	}

	/// The producer endpoint. Every call returns the same handle for the
	/// subject's lifetime.
	pub fn producer(&self) -> &Producer<T, E> {
		&self.producer
	}

	/// Register `observer` for every subsequent emission.
	pub fn subscribe(
		&self,
		observer: Arc<dyn Observer<T, E>>,
	) -> Result<Subscription, SubjectError> {
		self.core.live()?;
		self.core.drain_retired();

		let id = self.core.next_id.fetch_add(1, Ordering::Relaxed);
		let retired = Arc::new(AtomicBool::new(false));
		self.core.sinks.write().push(Sink {
			id,
			observer,
			retired: retired.clone(),
		});
		Ok(Subscription {
			id,
			retired,
			retire_queue: self.core.retired.clone(),
		})
	}

	/// Tear the subject down. Idempotent; every later emission or
	/// subscribe fails with [`SubjectError::Disposed`].
	pub fn dispose(&self) {
		self.core.state.store(DISPOSED, Ordering::Release);
		self.core.sinks.write().clear();
	}
}

impl<T, E> Default for Subject<T, E> {
	fn default() -> Self {
		Self::new()
	}
}

/// Emitting half of a [`Subject`].
pub struct Producer<T, E> {
	core: Arc<Core<T, E>>,
}

impl<T, E> Producer<T, E> {
	/// Deliver `value` to every sink registered at the time of the call.
	pub fn on_next(&self, value: T) -> Result<(), SubjectError> {
		self.core.dispatch(|observer| observer.on_next(&value))
	}

	/// Deliver a terminal error. Later emissions are dropped.
	pub fn on_error(&self, error: E) -> Result<(), SubjectError> {
		self.core.dispatch(|observer| observer.on_error(&error))?;
		self.core.state.store(STOPPED, Ordering::Release);
		Ok(())
	}

	/// Deliver completion. Later emissions are dropped.
	pub fn on_completed(&self) -> Result<(), SubjectError> {
		self.core.dispatch(|observer| observer.on_completed())?;
		self.core.state.store(STOPPED, Ordering::Release);
		Ok(())
	}
}

/// Handle to one registration on a [`Subject`].
///
/// Does nothing on drop; delivery stops only when
/// [`dispose`](Subscription::dispose) is called.
#[derive(Debug)]
pub struct Subscription {
	id: u64,
	retired: Arc<AtomicBool>,
	retire_queue: Arc<SegQueue<u64>>,
}

impl Subscription {
	/// Stop delivery to this registration. Idempotent.
	pub fn dispose(&self) {
		if !self.retired.swap(true, Ordering::AcqRel) {
			self.retire_queue.push(self.id);
		}
	}
}
