//! Graph algorithms module
//!
//! Traversal helpers that run directly against the in-process [`GraphStore`](crate::graph::GraphStore).

pub mod pathfinding;

pub use pathfinding::{bounded_shortest_path, PathResult};
