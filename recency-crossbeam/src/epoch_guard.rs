//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! # Design
//!
//! `EpochGuard` is a zero-sized type that schedules destruction using the global
//! epoch collector. A cache parameterized with `EpochGuard` reclaims every node
//! it evicts or moves once no pinned reader can still reach it:
//!
//! ```text
//! ConcurrentLruCache<K, V, EpochGuard>
//!     │
//!     ├── get/set/entries pin the thread for the whole operation
//!     └── nodes whose link count hits zero go to the epoch collector
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use recency_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Nodes are not freed until all threads have advanced past the epoch in which
/// they were retired, so a reader that pinned before the retirement may keep
/// walking over them.
///
/// When `defer_destroy` is called, it:
/// 1. Pins the current thread (re-entrant if the operation already pinned)
/// 2. Schedules the destruction to run after all threads have advanced
/// 3. Unpins
///
/// # Performance
///
/// - **Pin overhead**: Very low (thread-local check)
/// - **Reclamation**: Batched, amortized O(1) per node
/// - **Memory**: Every promotion retires one node; garbage accumulates while
///   a thread stays pinned
///
#[derive(Clone, Copy, Default)]
pub struct EpochGuard {
    // Zero-sized - all state is in the global epoch collector
}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

// EpochGuard is Send and Sync since it's stateless (zero-sized)
unsafe impl Send for EpochGuard {}
unsafe impl Sync for EpochGuard {}

impl Guard for EpochGuard {
    /// A pinned crossbeam guard, held for the duration of one cache operation.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}
