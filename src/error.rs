//! Error types for the ranked-memo library.
//!
//! - [`ConfigError`]: invalid construction parameters (zero capacity,
//!   out-of-range age threshold).
//! - [`CacheError`]: runtime failures of a cache operation, including a
//!   captured memoized-function error.
//! - [`SubjectError`]: operations on a disposed [`Subject`](crate::Subject).

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when factory configuration parameters are invalid.
///
/// Produced by [`CacheFactory::try_new`](crate::CacheFactory::try_new).
/// Carries a human-readable description of which parameter failed
/// validation.
///
/// # Example
///
/// ```
/// use ranked_memo::CacheFactory;
///
/// let err = CacheFactory::try_new(|s| s.hit_count as f64, 0, 0.5, false).unwrap_err();
/// assert!(err.to_string().contains("max_capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
	/// Creates a new `ConfigError` with the given description.
	#[inline]
	pub fn new(msg: impl Into<String>) -> Self {
		Self(msg.into())
	}

	/// Returns the error description.
	#[inline]
	pub fn message(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
///
/// `E` is the error type of the memoized function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E> {
	/// The cache has been disposed; no further operations are possible.
	Disposed,
	/// `dispose` could not take exclusive ownership because the cache is in
	/// use. The caller may retry.
	InUse,
	/// The outcome view was requested on a cache built without error
	/// caching.
	ErrorCachingDisabled,
	/// The memoized function failed. When error caching is enabled the same
	/// error is served for every lookup of the key until eviction.
	Computation(E),
}

impl<E: fmt::Display> fmt::Display for CacheError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CacheError::Disposed => f.write_str("cache has been disposed"),
			CacheError::InUse => f.write_str("cache is in use; dispose would block"),
			CacheError::ErrorCachingDisabled => {
				f.write_str("outcome view requires error caching")
			}
			CacheError::Computation(e) => write!(f, "memoized function failed: {e}"),
		}
	}
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for CacheError<E> {}

// ---------------------------------------------------------------------------
// SubjectError
// ---------------------------------------------------------------------------

/// Error returned by subject operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectError {
	/// The subject has been disposed; emissions and subscriptions are
	/// rejected.
	Disposed,
}

impl fmt::Display for SubjectError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SubjectError::Disposed => f.write_str("subject has been disposed"),
		}
	}
}

impl std::error::Error for SubjectError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
