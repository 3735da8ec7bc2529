use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::data_structures::{CacheEntry, NodeIndex, NodePtr, RecencyList};
use crate::error::CacheError;
use crate::guard::Guard;

/// Capacity used by `Default`; one cache of this size per formatted
/// representation is the usual sizing.
pub const DEFAULT_CAPACITY: usize = 128;

///
/// Thread-safe, capacity-bounded least recently used cache.
///
/// The key index is a concurrent hash map; recency is tracked by a lock-free
/// doubly linked list. No operation takes a lock on the list or blocks.
///
/// ```text
///   index: key ─────────────┐
///                           ▼
///   HEADER ⇄ [k3] ⇄ [k1] ⇄ [k2] ⇄ TRAILER
///   (most recent)              (evicted first)
/// ```
///
/// `get` is a visible mutation: a hit moves the entry to the head.
///
/// Under concurrent inserts `size()` may briefly exceed `capacity()`; once
/// every call has returned it does not. Eviction takes whichever node is
/// currently nearest the trailer, and racing evictions may drop more than one
/// entry per insert. Both are relaxations of strict LRU, not defects.
///
pub struct ConcurrentLruCache<K, V, G, S = RandomState>
where
    K: Hash + Eq + 'static,
    V: 'static,
    G: Guard,
    S: BuildHasher + Clone,
{
    list: RecencyList<K, V, G>,
    index: NodeIndex<K, V, S>,
    capacity: usize,
}

// Safety: shared state is the list (atomics + guard) and the index (DashMap).
unsafe impl<K, V, G, S> Send for ConcurrentLruCache<K, V, G, S>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
    G: Guard,
    S: BuildHasher + Clone + Send,
{
}

unsafe impl<K, V, G, S> Sync for ConcurrentLruCache<K, V, G, S>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
    G: Guard,
    S: BuildHasher + Clone + Send + Sync,
{
}

impl<K, V, G> ConcurrentLruCache<K, V, G, RandomState>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
    G: Guard,
{
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, V, G, S> ConcurrentLruCache<K, V, G, S>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
    G: Guard,
    S: BuildHasher + Clone,
{
    /// Creates an empty cache whose index hashes keys with `hasher`.
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        debug!(capacity, "created concurrent lru cache");
        Ok(ConcurrentLruCache {
            list: RecencyList::new(),
            index: NodeIndex::with_hasher(hasher),
            capacity,
        })
    }

    /// Returns a clone of the value for `key`, promoting it to most recently used.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_entry(key).map(|entry| entry.value().clone())
    }

    /// Returns the shared entry for `key`, promoting it to most recently used.
    ///
    pub fn get_entry(&self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        let _guard = G::pin();
        let node = self.index.find(key)?;

        unsafe {
            let entry = Arc::clone((*node).entry()?);
            loop {
                if self.list.delete(node) {
                    self.promote(key, node, &entry);
                    break;
                }
                // A lost CAS may only mean a traversal repaired `next`; give up
                // once another thread moved or evicted the node
                if (*node).is_deleted() || self.index.find(key) != Some(node) {
                    break;
                }
            }
            Some(entry)
        }
    }

    /// Associates `value` with `key` as the most recently used entry.
    ///
    /// Inserting a new key may evict the least recently used entries.
    ///
    pub fn set(&self, key: K, value: V) {
        let _guard = G::pin();
        let entry = Arc::new(CacheEntry::new(key.clone(), value));

        unsafe {
            // Move the most recently used node to the front
            if let Some(current) = self.index.find(&key) {
                self.list.delete(current);
            }

            let fresh = self.push_front(&entry);
            if let Some(displaced) = self.index.publish(key, fresh) {
                self.discard(displaced);
            }
            self.settle(entry.key(), fresh);
        }

        // Replacing a key leaves the size as is, but a racing eviction may
        // have given up while this key was off the list
        self.evict_overflow();
    }

    /// Whether `key` is present. Does not promote.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.find(key).is_some()
    }

    /// Live entries from most to least recently used.
    ///
    /// A snapshot; entries inserted or evicted meanwhile may or may not show.
    ///
    pub fn entries(&self) -> Vec<Arc<CacheEntry<K, V>>> {
        let _guard = G::pin();
        let mut entries = Vec::with_capacity(self.capacity);

        let mut curr = self.list.header();
        while let Some(node) = unsafe { self.list.forward(curr) } {
            if let Some(entry) = unsafe { (*node).entry() } {
                entries.push(Arc::clone(entry));
            }
            curr = node;
        }

        entries
    }

    /// The maximum number of entries, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of entries; approximate while other threads insert.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Re-insert `entry` at the head after its old node `stale` was deleted.
    ///
    unsafe fn promote(&self, key: &K, stale: NodePtr<K, V>, entry: &Arc<CacheEntry<K, V>>) {
        unsafe {
            let fresh = self.push_front(entry);

            if self.index.replace(key, stale, fresh) {
                self.list.release(stale);
                self.settle(key, fresh);
                // An eviction pass may have stopped while this entry was off the list
                self.evict_overflow();
            } else {
                // A concurrent set displaced the key while we were promoting
                self.discard(fresh);
            }
        }
    }

    /// Take a node that left the index off the list and give back its owner link.
    ///
    /// `delete` also fails when a traversal swings `next` past a deleted
    /// successor, so it is retried until the node is observed deleted.
    ///
    unsafe fn discard(&self, node: NodePtr<K, V>) {
        unsafe {
            while !(*node).is_deleted() {
                self.list.delete(node);
            }
            self.list.release(node);
        }
    }

    /// Append at the head, retrying until it succeeds.
    ///
    unsafe fn push_front(&self, entry: &Arc<CacheEntry<K, V>>) -> NodePtr<K, V> {
        loop {
            if let Some(node) = unsafe { self.list.append(self.list.header(), Arc::clone(entry)) } {
                return node;
            }
        }
    }

    /// Purge `node` from the index if an eviction deleted it before it was
    /// indexed; that eviction could not remove the entry itself.
    ///
    /// Deletion alone is not enough: a concurrent `get` may already be moving
    /// the freshly indexed node.
    ///
    unsafe fn settle(&self, key: &K, node: NodePtr<K, V>) {
        unsafe {
            if (*node).is_evicted() && self.index.remove_if(key, node) {
                self.list.release(node);
            }
        }
    }

    /// Delete nodes next to the trailer until the size is back within capacity.
    ///
    fn evict_overflow(&self) {
        while self.index.len() > self.capacity {
            let Some(coldest) = (unsafe { self.list.back(self.list.trailer()) }) else {
                // Remaining entries are mid-promotion; whoever finishes re-checks
                trace!(size = self.index.len(), "no live eviction candidate");
                return;
            };

            unsafe {
                // At most one thread wins the delete and purges the key
                if !self.list.delete(coldest) {
                    continue;
                }
                // Published before the index is checked; pairs with `settle`
                (*coldest).mark_evicted();
                let Some(entry) = (*coldest).entry() else {
                    continue;
                };
                if self.index.remove_if(entry.key(), coldest) {
                    self.list.release(coldest);
                    trace!(capacity = self.capacity, "evicted least recently used entry");
                }
            }
        }
    }
}

impl<K, V, G> Default for ConcurrentLruCache<K, V, G, RandomState>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
    G: Guard,
{
    fn default() -> Self {
        ConcurrentLruCache {
            list: RecencyList::new(),
            index: NodeIndex::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl<K, V, G, S> Drop for ConcurrentLruCache<K, V, G, S>
where
    K: Hash + Eq + 'static,
    V: 'static,
    G: Guard,
    S: BuildHasher + Clone,
{
    fn drop(&mut self) {
        // Index links first; the list then drops its own links and sentinels.
        //
        for node in self.index.drain() {
            unsafe {
                self.list.release(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::guard::DeferredGuard;

    use super::*;

    type TestCache = ConcurrentLruCache<String, String, DeferredGuard>;

    fn keys(cache: &TestCache) -> Vec<String> {
        cache
            .entries()
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = TestCache::new(0);
        assert_eq!(result.err(), Some(CacheError::InvalidCapacity(0)));
    }

    #[test]
    fn test_default_capacity() {
        let cache = TestCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_drop_empty_and_used_cache() {
        let empty = TestCache::new(2).unwrap();
        drop(empty);

        let used = TestCache::new(2).unwrap();
        for key in ["a", "b", "c"] {
            used.set(key.to_string(), key.to_string());
        }
        used.get(&"b".to_string());
        drop(used);
    }

    #[test]
    fn test_get_promotes_entry() {
        let cache = TestCache::new(4).unwrap();
        for key in ["a", "b", "c"] {
            cache.set(key.to_string(), key.repeat(2));
        }
        assert_eq!(keys(&cache), vec!["c", "b", "a"]);

        assert_eq!(cache.get(&"a".to_string()), Some("aa".to_string()));
        assert_eq!(keys(&cache), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_set_existing_key_replaces_value() {
        let cache = TestCache::new(4).unwrap();
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.set("a".to_string(), "3".to_string());

        assert_eq!(cache.size(), 2);
        assert_eq!(keys(&cache), vec!["a", "b"]);
        assert_eq!(cache.get(&"a".to_string()), Some("3".to_string()));
    }

    #[test]
    fn test_contains_key_does_not_promote() {
        let cache = TestCache::new(2).unwrap();
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());

        assert!(cache.contains_key(&"a".to_string()));
        cache.set("c".to_string(), "3".to_string());

        // "a" stayed least recently used
        assert!(!cache.contains_key(&"a".to_string()));
        assert_eq!(keys(&cache), vec!["c", "b"]);
    }

    #[test]
    fn test_get_entry_shares_value() {
        let cache = TestCache::new(2).unwrap();
        cache.set("frame".to_string(), "Main.java:42".to_string());

        let first = cache.get_entry(&"frame".to_string()).unwrap();
        let second = cache.get_entry(&"frame".to_string()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.value(), "Main.java:42");
    }

    #[test]
    fn test_index_matches_list_after_churn() {
        let cache = TestCache::new(8).unwrap();
        for i in 0..100 {
            cache.set(format!("k{}", i % 13), i.to_string());
            cache.get(&format!("k{}", i % 7));
        }

        let listed = keys(&cache);
        assert_eq!(listed.len(), cache.size());
        for key in &listed {
            assert!(cache.contains_key(key));
        }
    }
}
