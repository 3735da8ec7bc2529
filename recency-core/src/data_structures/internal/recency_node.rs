use std::fmt;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

use crate::data_structures::CacheEntry;

pub type NodePtr<K, V> = *mut RecencyNode<K, V>;

/// Role of a node in the recency list.
///
/// Markers are a distinct variant rather than a node whose `prev` points at
/// itself, so a marker never owns a reference cycle.
///
pub enum NodeKind<K, V> {
    /// First sentinel, no predecessor.
    Header,
    /// Last sentinel, no successor.
    Trailer,
    /// Deletion tombstone installed as the successor of a deleted node.
    Marker,
    /// Ordinary cache entry.
    Live(Arc<CacheEntry<K, V>>),
}

///
/// Node of the lock-free doubly linked recency list.
///
/// `next` is the only link that authorizes structural changes. `prev` is a hint
/// repaired lazily by traversals; it has to be atomic because Rust does not
/// allow racy plain fields, but nothing ever trusts it without checking `next`.
///
// LINK COUNTING
// =============
//
// A node may be freed only when nothing can lead a newly pinned reader to it.
// Three kinds of references exist:
//
//   list  - held while the node is physically linked; dropped by the thread
//           whose CAS unlinks it
//   owner - handed to the caller of `append`; the cache moves it into the index
//           and the thread that removes the index entry drops it
//   prev  - one per `prev` hint pointing at the node
//
// When the count reaches zero the node is handed to the guard and its own
// `prev` hint is released, which may cascade to older garbage.
//
// Sentinels start at one and never reach zero. Markers are not counted: a marker
// is owned by the node it tombstones and freed together with it.
//
pub struct RecencyNode<K, V> {
    kind: NodeKind<K, V>,
    next: AtomicPtr<RecencyNode<K, V>>,
    prev: AtomicPtr<RecencyNode<K, V>>,
    links: AtomicUsize,
    /// Set by the thread whose eviction deleted the node.
    evicted: AtomicBool,
}

impl<K, V> RecencyNode<K, V> {
    pub(crate) fn new_header() -> Self {
        RecencyNode {
            kind: NodeKind::Header,
            next: AtomicPtr::new(ptr::null_mut()),
            prev: AtomicPtr::new(ptr::null_mut()),
            links: AtomicUsize::new(1),
            evicted: AtomicBool::new(false),
        }
    }

    pub(crate) fn new_trailer(header: NodePtr<K, V>) -> Self {
        RecencyNode {
            kind: NodeKind::Trailer,
            next: AtomicPtr::new(ptr::null_mut()),
            prev: AtomicPtr::new(header),
            links: AtomicUsize::new(1),
            evicted: AtomicBool::new(false),
        }
    }

    /// New live node; starts with the list link and the owner link.
    pub(crate) fn new_live(entry: Arc<CacheEntry<K, V>>) -> Self {
        RecencyNode {
            kind: NodeKind::Live(entry),
            next: AtomicPtr::new(ptr::null_mut()),
            prev: AtomicPtr::new(ptr::null_mut()),
            links: AtomicUsize::new(2),
            evicted: AtomicBool::new(false),
        }
    }

    pub(crate) fn new_marker(successor: NodePtr<K, V>) -> Self {
        RecencyNode {
            kind: NodeKind::Marker,
            next: AtomicPtr::new(successor),
            prev: AtomicPtr::new(ptr::null_mut()),
            links: AtomicUsize::new(0),
            evicted: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> &NodeKind<K, V> {
        &self.kind
    }

    pub fn entry(&self) -> Option<&Arc<CacheEntry<K, V>>> {
        match &self.kind {
            NodeKind::Live(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self.kind, NodeKind::Header)
    }

    pub fn is_trailer(&self) -> bool {
        matches!(self.kind, NodeKind::Trailer)
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, NodeKind::Marker)
    }

    /// Header, trailer or marker.
    pub fn is_special(&self) -> bool {
        !matches!(self.kind, NodeKind::Live(_))
    }

    /// A node is deleted iff its successor is a marker.
    ///
    /// Dereferences `next`, so the node must be protected by the caller's pin.
    pub fn is_deleted(&self) -> bool {
        let f = self.get_next();
        !f.is_null() && unsafe { (*f).is_marker() }
    }

    /// Record that this node left the list through eviction rather than a move.
    pub(crate) fn mark_evicted(&self) {
        self.evicted.store(true, Ordering::Release)
    }

    pub(crate) fn is_evicted(&self) -> bool {
        self.evicted.load(Ordering::Acquire)
    }

    // =========================================================================
    // Link accessors
    // =========================================================================

    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr<K, V> {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_next(&self, next: NodePtr<K, V>) {
        self.next.store(next, Ordering::Release)
    }

    #[inline]
    pub(crate) fn cas_next(
        &self,
        expected: NodePtr<K, V>,
        new: NodePtr<K, V>,
    ) -> Result<NodePtr<K, V>, NodePtr<K, V>> {
        self.next
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn get_prev(&self) -> NodePtr<K, V> {
        self.prev.load(Ordering::Acquire)
    }

    /// Store a prev hint on a node nobody else can see yet.
    #[inline]
    pub(crate) fn init_prev(&self, prev: NodePtr<K, V>) {
        self.prev.store(prev, Ordering::Relaxed)
    }

    /// Replace the prev hint, returning the old one (whose link the caller owns).
    #[inline]
    pub(crate) fn swap_prev(&self, prev: NodePtr<K, V>) -> NodePtr<K, V> {
        self.prev.swap(prev, Ordering::AcqRel)
    }

    /// Returns next node, skipping over a deletion marker.
    pub(crate) fn next_nonmarker(&self) -> NodePtr<K, V> {
        let f = self.get_next();
        if f.is_null() || unsafe { !(*f).is_marker() } {
            f
        } else {
            unsafe { (*f).get_next() }
        }
    }

    // =========================================================================
    // Link counting
    // =========================================================================

    /// Take a link unless the count already reached zero.
    pub(crate) fn try_acquire(&self) -> bool {
        let mut links = self.links.load(Ordering::Acquire);
        loop {
            if links == 0 {
                return false;
            }
            match self.links.compare_exchange_weak(
                links,
                links + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => links = actual,
            }
        }
    }

    /// Drop a link. Returns true if this was the last one.
    pub(crate) fn release_link(&self) -> bool {
        let previous = self.links.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "link count underflow");
        previous == 1
    }

    #[cfg(test)]
    pub(crate) fn links(&self) -> usize {
        self.links.load(Ordering::Acquire)
    }

    /// Deallocate a reclaimed node together with the marker it owns.
    ///
    /// # Safety
    /// - `ptr` must come from `Box::into_raw` and must not be used afterwards
    /// - `next` must be null or this node's own deletion marker
    ///
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr<K, V>) {
        let node = unsafe { Box::from_raw(ptr) };
        let next = node.next.load(Ordering::Acquire);
        if !next.is_null() && unsafe { (*next).is_marker() } {
            drop(unsafe { Box::from_raw(next) });
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RecencyNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Header => f.write_str("header"),
            NodeKind::Trailer => f.write_str("trailer"),
            NodeKind::Marker => f.write_str("marker"),
            NodeKind::Live(entry) if self.is_deleted() => write!(f, "{:?} (deleted)", entry),
            NodeKind::Live(entry) => write!(f, "{:?}", entry),
        }
    }
}
