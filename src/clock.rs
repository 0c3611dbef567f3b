use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic tick source used to stamp entries and to measure invocation
/// and lookup costs.
///
/// One tick is one nanosecond, so `elapsed_ticks` and `elapsed` are
/// interconvertible via that fixed ratio. Implementations must never go
/// backward.
pub trait Clock: Send + Sync {
	/// Ticks elapsed since the clock was started.
	fn elapsed_ticks(&self) -> u64;

	/// Elapsed time since the clock was started.
	fn elapsed(&self) -> Duration {
		Duration::from_nanos(self.elapsed_ticks())
	}
}

/// Wall clock backed by [`Instant`].
///
/// This is the clock every cache gets unless its factory was configured
/// with a custom one.
pub struct MonotonicClock {
	start: Instant,
}

impl MonotonicClock {
	/// Start a new clock. Ticks count from zero.
	pub fn start() -> Self {
		Self {
			start: Instant::now(),
		}
	}
}

impl Clock for MonotonicClock {
	fn elapsed_ticks(&self) -> u64 {
		// Instant is monotonic; ~584 years of nanoseconds fit in u64.
		u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
	}
}

/// Deterministic clock driven by [`advance`](ManualClock::advance).
///
/// Useful in tests and wherever age ordering must be reproducible.
///
/// # Example
///
/// ```
/// use ranked_memo::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// assert_eq!(clock.elapsed_ticks(), 0);
/// clock.advance(250);
/// assert_eq!(clock.elapsed_ticks(), 250);
/// ```
pub struct ManualClock {
	ticks: AtomicU64,
}

impl ManualClock {
	/// Create a clock at tick zero.
	pub fn new() -> Self {
		Self {
			ticks: AtomicU64::new(0),
		}
	}

	/// Advance the clock by `ticks`.
	pub fn advance(&self, ticks: u64) {
		self.ticks.fetch_add(ticks, Ordering::Release);
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for ManualClock {
	fn elapsed_ticks(&self) -> u64 {
		self.ticks.load(Ordering::Acquire)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_monotonic_never_goes_backward() {
		let clock = MonotonicClock::start();

		let mut previous = clock.elapsed_ticks();
		for _ in 0..1000 {
			let now = clock.elapsed_ticks();
			assert!(now >= previous);
			previous = now;
		}
	}

	#[test]
	fn test_ticks_and_duration_agree() {
		let clock = ManualClock::new();
		clock.advance(1_500_000);

		assert_eq!(clock.elapsed_ticks(), 1_500_000);
		assert_eq!(clock.elapsed(), Duration::from_nanos(1_500_000));
	}

	#[test]
	fn test_manual_clock_accumulates() {
		let clock = ManualClock::new();

		clock.advance(10);
		clock.advance(32);
		assert_eq!(clock.elapsed_ticks(), 42);
	}

	#[test]
	fn test_manual_clock_concurrent_advance() {
		use std::sync::Arc;
		use std::thread;

		let clock = Arc::new(ManualClock::new());
		let handles: Vec<_> = (0..4)
			.map(|_| {
				let clock = clock.clone();
				thread::spawn(move || {
					for _ in 0..100 {
						clock.advance(1);
					}
				})
			})
			.collect();

		for handle in handles {
			handle.join().unwrap();
		}

		assert_eq!(clock.elapsed_ticks(), 400);
	}
}
