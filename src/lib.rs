//! # ranked-memo
//!
//! A weak-keyed memoization cache with ranked, age-guarded eviction:
//! - **Weak keys**: entries never keep their key alive; dropping the last
//!   outside handle makes the entry reclaimable.
//! - **Reference identity**: two keys are the same entry iff they are the
//!   same `Arc` allocation, not structurally equal.
//! - **Ranked eviction** driven by a caller-supplied metric over per-entry
//!   statistics (hit count, accumulated lookup cost, last access,
//!   invocation cost).
//! - **Age shield**: only the oldest fraction of capacity is eviction
//!   candidate material, so fresh inserts cannot thrash each other out.
//! - **Optional error caching**: failures of the memoized function can be
//!   captured and served like values.
//!
//! A small broadcast [`Subject`] is included for fanning values out to an
//! evolving set of observers with snapshot-based dispatch.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ranked_memo::{CacheFactory, StatsSnapshot};
//!
//! // Evict the least-hit entries among the oldest half of the cache.
//! let factory = CacheFactory::try_new(
//! 	|stats: &StatsSnapshot| stats.hit_count as f64,
//! 	256,
//! 	0.5,
//! 	false,
//! )
//! .expect("valid configuration");
//!
//! let cache = factory.create_cache(|word: &String| Ok::<_, String>(word.len()));
//!
//! let key = Arc::new("memoize".to_string());
//! assert_eq!(cache.get_or_add(&key).unwrap(), 7);
//! assert_eq!(cache.get_or_add(&key).unwrap(), 7); // served from cache
//! assert_eq!(cache.count(), 1);
//!
//! // Dropping the key releases the entry to the next trim.
//! drop(key);
//! cache.trim_stats(|_| false).unwrap();
//! assert_eq!(cache.count(), 0);
//! ```
//!
//! ## Thread Safety
//!
//! The cache is `Send + Sync` and can be shared across threads via
//! `Arc`. Lookups hold the upgradeable-read side of the cache lock;
//! observational reads never block.

mod builder;
mod cache;
mod clock;
mod entry;
mod entry_set;
mod error;
mod metrics;
mod stats;
mod subject;
mod weak_map;

pub use builder::{CacheFactory, CacheOptions, Ranker};
pub use cache::Cache;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entry::Outcome;
pub use error::{CacheError, ConfigError, SubjectError};
pub use metrics::CacheMetrics;
pub use stats::StatsSnapshot;
pub use subject::{Observer, Producer, Subject, Subscription};
