//! Lock-free linked structures.
//!
//! The list is parameterized by a guard type `G: Guard` that determines the
//! memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until guard drops
//! - `EpochGuard`: Production - epoch-based reclamation (crossbeam-epoch)

pub mod recency_list;
pub mod recency_list_marker_protocol;

pub use recency_list::RecencyList;
