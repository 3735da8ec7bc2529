//! Data structures for the concurrent LRU cache.
//!
//! # Organization
//!
//! - [`linked`] - Lock-free recency list (append, delete, traversal)
//! - [`cache`] - Key index and the LRU cache on top of the list
//! - [`internal`] - Node representation and link counting

// Submodules
pub mod cache;
pub(crate) mod internal;
pub mod linked;

// Re-exports for convenience
pub use cache::{CacheEntry, ConcurrentLruCache, DEFAULT_CAPACITY, NodeIndex};
pub use internal::{NodeKind, NodePtr, RecencyNode};
pub use linked::RecencyList;
