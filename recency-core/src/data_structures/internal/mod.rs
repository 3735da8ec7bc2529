//! Internal implementation details.
//!
//! The node type is public only because the raw list API hands out node
//! pointers.

pub mod recency_node;

pub use recency_node::{NodeKind, NodePtr, RecencyNode};
