//! Concurrent LRU cache built from the recency list and a key index.

pub mod cache_entry;
pub mod concurrent_lru_cache;
pub mod node_index;

pub use cache_entry::CacheEntry;
pub use concurrent_lru_cache::{ConcurrentLruCache, DEFAULT_CAPACITY};
pub use node_index::NodeIndex;
