use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use dashmap::DashMap;

use crate::data_structures::NodePtr;

/// Node pointer stored in the index.
struct NodeHandle<K, V>(NodePtr<K, V>);

// Manual impls to avoid requiring K/V: Clone/Copy
impl<K, V> Copy for NodeHandle<K, V> {}

impl<K, V> Clone for NodeHandle<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

// Safety: the handle is only an address; dereferencing it is governed by the
// list's guard and link counting.
unsafe impl<K: Send + Sync, V: Send + Sync> Send for NodeHandle<K, V> {}
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for NodeHandle<K, V> {}

/// Concurrent key → node map.
///
/// The index is unordered; recency lives in the list. Every entry owns one
/// link on the node it points to, and whoever takes a node out of the index
/// (displacing, replacing or removing it) receives that link and must give it
/// back to the list.
///
/// `replace` and `remove_if` only act when the entry still maps to the node
/// the caller expects, so a late promotion or eviction can never clobber an
/// entry that already belongs to a newer node for the same key.
///
pub struct NodeIndex<K, V, S = RandomState> {
    map: DashMap<K, NodeHandle<K, V>, S>,
}

impl<K, V> NodeIndex<K, V, RandomState>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        NodeIndex {
            map: DashMap::new(),
        }
    }
}

impl<K, V> Default for NodeIndex<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> NodeIndex<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    pub fn with_hasher(hasher: S) -> Self {
        NodeIndex {
            map: DashMap::with_hasher(hasher),
        }
    }

    /// Node currently registered for `key`.
    pub fn find(&self, key: &K) -> Option<NodePtr<K, V>> {
        self.map.get(key).map(|handle| handle.0)
    }

    /// Register `node` for `key`, returning the node it displaced.
    pub fn publish(&self, key: K, node: NodePtr<K, V>) -> Option<NodePtr<K, V>> {
        self.map.insert(key, NodeHandle(node)).map(|handle| handle.0)
    }

    /// Point `key` at `fresh` if it still maps to `expected`.
    pub fn replace(&self, key: &K, expected: NodePtr<K, V>, fresh: NodePtr<K, V>) -> bool {
        let Some(mut handle) = self.map.get_mut(key) else {
            return false;
        };
        if handle.0 != expected {
            return false;
        }
        handle.0 = fresh;
        true
    }

    /// Remove `key` if it still maps to `expected`.
    pub fn remove_if(&self, key: &K, expected: NodePtr<K, V>) -> bool {
        self.map
            .remove_if(key, |_, handle| handle.0 == expected)
            .is_some()
    }

    /// Take every node out of the index.
    pub fn drain(&self) -> Vec<NodePtr<K, V>> {
        let nodes: Vec<_> = self.map.iter().map(|entry| entry.value().0).collect();
        self.map.clear();
        nodes
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
