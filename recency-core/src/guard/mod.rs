//! Guard trait for memory reclamation strategies.
//!
//! Nodes of the recency list are unlinked while other threads may still be
//! walking over them, so they cannot be freed on the spot. The `Guard` trait
//! abstracts over how (and when) an unlinked node is finally destroyed:
//!
//! ```text
//! ConcurrentLruCache<K, V, G: Guard>
//!     │
//!     ├── ConcurrentLruCache<K, V, EpochGuard>      (production)
//!     └── ConcurrentLruCache<K, V, DeferredGuard>   (testing)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recency_core::ConcurrentLruCache;
//! use recency_crossbeam::EpochGuard;
//!
//! let cache: ConcurrentLruCache<&str, String, EpochGuard> = ConcurrentLruCache::new(128)?;
//! cache.set("main", "main.rs:42".to_string());
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// - **EpochGuard**: Low overhead, batched reclamation (crossbeam-epoch)
/// - **DeferredGuard**: Defers all destruction until the guard drops (testing)
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any `ReadGuard` pinned before the call is still alive.
///
/// Guards are stored in the list and must be `Send + Sync`. Thread pinning
/// happens per operation through [`Guard::pin`], not when the guard is created.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this is a pinned `crossbeam_epoch::Guard`.
    /// For deferred guards it is `()`, since nothing is freed before the
    /// owning collection drops.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard for the duration of one operation.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the list
    /// - `node` must be unreachable for any reader that pins after this call
    /// - `dealloc` must be the correct deallocation function for `node`
    /// - the same `node` must not be scheduled twice
    ///
    /// `N: 'static` because destruction may run after the owning list is gone.
    ///
    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
