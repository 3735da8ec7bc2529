use std::ptr;
use std::sync::Arc;

use crate::data_structures::{CacheEntry, NodePtr, RecencyNode};
use crate::guard::Guard;

///
/// Lock-free doubly linked list ordered by recency, bounded by two permanent
/// sentinels. Header side is most recently used, trailer side least.
///
/// Deletion installs a marker node as the successor of the deleted node
/// (Sundell/Tsigas style, as in Doug Lea's ConcurrentDoublyLinkedList); see
/// [`recency_list_marker_protocol`](super::recency_list_marker_protocol) for
/// the protocol and the reclamation rules.
///
// INVARIANTS:
// 1. The chain always runs HEADER ... TRAILER; sentinels are never deleted
// 2. A node is deleted iff node.next is a marker; the marker is permanent
// 3. Only a CAS on a non-marker `next` changes the structure
// 4. `prev` is a hint; every backward step is validated through `next`
// 5. Exactly one CAS unlinks a deleted node, and its winner drops the list link
//
pub struct RecencyList<K: 'static, V: 'static, G: Guard> {
    header: NodePtr<K, V>,
    trailer: NodePtr<K, V>,
    /// Shared guard instance for deferred destruction.
    guard: G,
}

// Safety: nodes are only reached through atomics and freed through the guard.
unsafe impl<K, V, G> Send for RecencyList<K, V, G>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    G: Guard,
{
}
unsafe impl<K, V, G> Sync for RecencyList<K, V, G>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    G: Guard,
{
}

impl<K: 'static, V: 'static, G: Guard> RecencyList<K, V, G> {
    pub fn new() -> Self {
        let header = Box::into_raw(Box::new(RecencyNode::new_header()));
        let trailer = Box::into_raw(Box::new(RecencyNode::new_trailer(header)));
        unsafe {
            (*header).set_next(trailer);
            // The trailer's prev hint counts like any other
            (*header).try_acquire();
        }

        RecencyList {
            header,
            trailer,
            guard: G::default(),
        }
    }

    pub fn header(&self) -> NodePtr<K, V> {
        self.header
    }

    pub fn trailer(&self) -> NodePtr<K, V> {
        self.trailer
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Tries to insert a live node holding `entry` right after `after`.
    ///
    /// Retries its own CAS until it either succeeds or observes `after`
    /// deleted, in which case it returns None and the caller picks a fresh
    /// position. The returned node carries one owner link the caller must
    /// either hand over or give back with [`release`](Self::release).
    ///
    /// # Safety
    /// The caller holds `G::pin()` and `after` is a sentinel or a node reached
    /// from this list under that pin.
    ///
    pub unsafe fn append(
        &self,
        after: NodePtr<K, V>,
        entry: Arc<CacheEntry<K, V>>,
    ) -> Option<NodePtr<K, V>> {
        unsafe {
            // The new node's prev hint points at `after`, which needs a link.
            // A node whose count already dropped to zero is deleted anyway.
            if !(*after).try_acquire() {
                return None;
            }

            let node = Box::into_raw(Box::new(RecencyNode::new_live(entry)));
            (*node).init_prev(after);

            loop {
                let f = (*after).get_next();
                if f.is_null() || (*f).is_marker() {
                    drop(Box::from_raw(node));
                    self.release(after);
                    return None;
                }

                (*node).set_next(f);
                if (*after).cas_next(f, node).is_ok() {
                    // Optimistically link
                    self.link_prev(f, node);
                    return Some(node);
                }
            }
        }
    }

    /// Marks `node` deleted by swinging its `next` from the live successor `f`
    /// to a fresh marker referencing `f`. Exactly one concurrent caller wins.
    ///
    /// On success it tries once to unlink `node` from its predecessor; a later
    /// traversal finishes the job otherwise. Never retries: the return value
    /// tells whether this call performed the logical deletion.
    ///
    /// # Safety
    /// The caller holds `G::pin()` and `node` was reached from this list (or
    /// its index) under that pin.
    ///
    pub unsafe fn delete(&self, node: NodePtr<K, V>) -> bool {
        unsafe {
            if (*node).is_special() {
                return false;
            }

            let b = (*node).get_prev();
            let f = (*node).get_next();
            if f.is_null() || (*f).is_marker() {
                return false;
            }

            let marker = Box::into_raw(Box::new(RecencyNode::new_marker(f)));
            if (*node).cas_next(f, marker).is_err() {
                drop(Box::from_raw(marker));
                return false;
            }

            // `b` is null only for a node whose hints were already dropped
            if !b.is_null() && (*b).cas_next(node, f).is_ok() {
                self.link_prev(f, b);
                self.release(node);
            }
            true
        }
    }

    /// Returns the next non-deleted node, swinging `next` around deleted nodes
    /// and repairing the successor's prev hint. None if `node` is the trailer.
    ///
    /// # Safety
    /// The caller holds `G::pin()` and `node` is a sentinel or was reached
    /// forward from a live node under that pin.
    ///
    pub unsafe fn successor(&self, node: NodePtr<K, V>) -> Option<NodePtr<K, V>> {
        unsafe {
            let mut f = (*node).next_nonmarker();
            loop {
                if f.is_null() {
                    return None;
                }

                if !(*f).is_deleted() {
                    if (*f).get_prev() != node && !(*node).is_deleted() {
                        // Relink f's prev
                        self.link_prev(f, node);
                    }
                    return Some(f);
                }

                let s = (*f).next_nonmarker();
                if f == (*node).get_next() && (*node).cas_next(f, s).is_ok() {
                    // Unlinked f
                    self.release(f);
                }
                f = s;
            }
        }
    }

    /// Returns the previous non-deleted node, repairing pointers on the way.
    ///
    /// None for the header. May also be None when `node` itself is deleted,
    /// since a fully unlinked node has no recoverable predecessor.
    ///
    /// # Safety
    /// Same as [`successor`](Self::successor).
    ///
    pub unsafe fn predecessor(&self, node: NodePtr<K, V>) -> Option<NodePtr<K, V>> {
        unsafe {
            let mut n = node;
            loop {
                let b = (*n).get_prev();
                if b.is_null() {
                    // Header, or a reclaimed node whose hint is gone
                    return self.find_predecessor_of(self.header, node);
                }

                let s = (*b).get_next();
                if s == node {
                    return Some(b);
                }

                if s.is_null() || !(*s).is_marker() {
                    // b is live: search forward from it
                    if let Some(p) = self.find_predecessor_of(b, node) {
                        return Some(p);
                    }
                }

                n = b;
            }
        }
    }

    /// Next live entry node, skipping sentinels.
    ///
    /// # Safety
    /// Same as [`successor`](Self::successor).
    ///
    pub unsafe fn forward(&self, node: NodePtr<K, V>) -> Option<NodePtr<K, V>> {
        unsafe { self.successor(node).filter(|f| !(**f).is_special()) }
    }

    /// Previous live entry node, skipping sentinels. Beware that from a
    /// deleted node there may be no usable predecessor.
    ///
    /// # Safety
    /// Same as [`successor`](Self::successor).
    ///
    pub unsafe fn back(&self, node: NodePtr<K, V>) -> Option<NodePtr<K, V>> {
        unsafe { self.predecessor(node).filter(|b| !(**b).is_special()) }
    }

    /// Gives back one link of `node`, reclaiming it (and any garbage its
    /// prev hint was keeping alive) once nothing references it.
    ///
    /// # Safety
    /// The caller owns the link being released.
    ///
    pub unsafe fn release(&self, node: NodePtr<K, V>) {
        let mut curr = node;
        // Iterative: a reclaimed node drops its own prev hint, which can
        // cascade through a chain of older garbage.
        while !curr.is_null() {
            unsafe {
                if !(*curr).release_link() {
                    return;
                }
                let prev = (*curr).swap_prev(ptr::null_mut());
                self.guard.defer_destroy(curr, RecencyNode::dealloc_ptr);
                curr = prev;
            }
        }
    }

    /// Points `node.prev` at `prev`, moving the hint's link.
    ///
    /// Holds a link on `node` itself meanwhile so a concurrent reclamation
    /// cannot race the store. Gives up silently if either node is already
    /// being reclaimed; the hint stays stale, which traversals tolerate.
    ///
    unsafe fn link_prev(&self, node: NodePtr<K, V>, prev: NodePtr<K, V>) {
        unsafe {
            if !(*node).try_acquire() {
                return;
            }
            if (*prev).try_acquire() {
                let old = (*node).swap_prev(prev);
                self.release(old);
            }
            self.release(node);
        }
    }

    /// Apparent predecessor of `target`, searching forward from `start`.
    unsafe fn find_predecessor_of(
        &self,
        start: NodePtr<K, V>,
        target: NodePtr<K, V>,
    ) -> Option<NodePtr<K, V>> {
        let mut n = start;
        loop {
            let f = unsafe { self.successor(n) }?;
            if f == target {
                return Some(n);
            }
            n = f;
        }
    }
}

impl<K: 'static, V: 'static, G: Guard> Default for RecencyList<K, V, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: 'static, V: 'static, G: Guard> Drop for RecencyList<K, V, G> {
    fn drop(&mut self) {
        // Every node still in the chain, deleted or not, holds its list link.
        //
        unsafe {
            let mut curr = (*self.header).get_next();

            while curr != self.trailer {
                let next = (*curr).get_next();
                let successor = if (*next).is_marker() {
                    (*next).get_next()
                } else {
                    // Only a deletion marker may stay behind for dealloc_ptr
                    (*curr).set_next(ptr::null_mut());
                    next
                };

                self.release(curr);
                curr = successor;
            }

            let last = (*self.trailer).swap_prev(ptr::null_mut());
            self.release(last);

            drop(Box::from_raw(self.header));
            drop(Box::from_raw(self.trailer));
        }
    }
}

// ============================================================================
// Tests - list primitives
// ============================================================================
// Note: cache level tests are in common_tests and tests/
