//! Lock-free, capacity-bounded LRU cache.
//!
//! Recency is kept in a lock-free doubly linked list with marker-based
//! deletion; keys are found through a concurrent hash index. Memory
//! reclamation is pluggable through [`Guard`]: use `recency_crossbeam::EpochGuard`
//! in production and [`DeferredGuard`] in tests.

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{CacheEntry, ConcurrentLruCache, DEFAULT_CAPACITY};
pub use error::CacheError;
pub use guard::{DeferredGuard, Guard};
