//! Crossbeam-based memory reclamation for the recency cache.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch, and the `EpochLruCache` alias built on it.
//!
//! # Usage
//!
//! ```ignore
//! use recency_crossbeam::EpochLruCache;
//!
//! let cache: EpochLruCache<String, String> = EpochLruCache::new(128)?;
//! cache.set("main".to_string(), "main.rs:42".to_string());
//! assert_eq!(cache.get(&"main".to_string()), Some("main.rs:42".to_string()));
//! ```

pub mod epoch_guard;

use recency_core::ConcurrentLruCache;

pub use epoch_guard::EpochGuard;

/// LRU cache reclaiming evicted and moved nodes through the global epoch collector.
///
/// Nodes may be destroyed after the cache itself is gone, so keys and values
/// must be `'static` (the cache type enforces this):
///
/// ```compile_fail
/// use recency_crossbeam::EpochLruCache;
///
/// let frame = String::from("main.rs:42");
/// let cache: EpochLruCache<&str, u32> = EpochLruCache::new(4).unwrap();
/// cache.set(frame.as_str(), 1);
/// ```
pub type EpochLruCache<K, V> = ConcurrentLruCache<K, V, EpochGuard>;
