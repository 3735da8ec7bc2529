//! # Recency List: Marker Deletion and Safe Hints
//!
//! Design notes for the lock-free doubly linked list behind the LRU cache.
//!
//! ## Structure
//!
//! ```text
//! HEADER ⇄ n1 ⇄ n2 ⇄ n3 ⇄ TRAILER
//!  (MRU)                     (LRU)
//! ```
//!
//! `next` links are authoritative; `prev` links are hints.
//!
//! ## DELETE Protocol
//!
//! To delete `curr` with apparent predecessor `b` and successor `f`:
//!
//! ```text
//! Initial: b → curr → f
//!
//! Step 1: Logical delete (linearization point, exactly one winner)
//!     CAS curr.next: f → marker(f)
//!
//!     b → curr → [marker] → f
//!
//! Step 2: Best-effort unlink
//!     CAS b.next: curr → f
//!     on success: f.prev = b, drop curr's list link
//! ```
//!
//! A failed step 2 is finished later by any `successor` call that walks over
//! `curr`: it swings its own `next` from `curr` to `f`.
//!
//! ## APPEND Protocol
//!
//! ```text
//! append(a, entry):
//!     loop:
//!         f = a.next
//!         if f is marker: return None     // a is deleted
//!         x = node(entry, next = f, prev = a)
//!         if CAS a.next: f → x:
//!             f.prev = x                  // optimistic hint
//!             return x
//! ```
//!
//! ## Backward Search
//!
//! ```text
//! predecessor(node):
//!     n = node
//!     loop:
//!         b = n.prev
//!         if b is null: search forward from HEADER
//!         if b.next == node: return b
//!         if b is live and a forward search from b finds node: return it
//!         n = b                            // b deleted, keep walking back
//! ```
//!
//! ## Reclamation
//!
//! Forward traversal is safe under a pin: a successor read from a live node was
//! linked when it was read, so it cannot have been reclaimed before the pin.
//!
//! Backward traversal is not safe by itself: a `prev` hint may point at a node
//! unlinked long ago. Hints are therefore counted. Every node carries a link
//! count (list membership + owner + one per `prev` pointing at it) and is
//! handed to the guard only when the count reaches zero:
//!
//! ```text
//! set_prev(node, p):
//!     acquire node                  // node cannot be reclaimed mid-store
//!     if acquire p succeeds:        // fails once p reached zero
//!         old = swap node.prev, p
//!         release old
//!     release node
//!
//! release(x):
//!     if --x.links == 0:
//!         p = swap x.prev, null     // pinned readers then fall back to HEADER
//!         defer_destroy x
//!         release p
//! ```
//!
//! So a pointer loaded from any `prev` field under a pin stays valid for the
//! rest of that pin: the link it represents was dropped after the load.
//!
//! ## Concurrent Scenario: Racing Evictions
//!
//! ```text
//! HEADER → a → b → c → TRAILER
//! T1, T2 both evict: back(TRAILER) = c
//!
//! T1: CAS c.next: TRAILER → marker     ✓   purges c's key
//! T2: CAS c.next: TRAILER → marker     ✗
//! T2: back(TRAILER) = b, deletes b     ✓   (may over-evict under bursts)
//! ```
//!
//! ## Invariants
//!
//! 1. Sentinels are never deleted
//! 2. Deleted iff `next` is a marker; markers are never removed from their node
//! 3. Exactly one CAS unlinks a deleted node
//! 4. Reclaimed only when unlinked, out of the index and no longer a hint
//! 5. Linearizable: append at CAS, delete at marker CAS
