//! In-process property graph
//!
//! This module implements the relationship graph data model with:
//! - Nodes with one label from a closed set and typed properties
//! - Directed edges with one kind from a closed set and typed properties
//! - Merge-on-key lookups for nodes (business key) and edges (endpoints + key)
//! - Adjacency lists for traversal

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeKind, NodeId, NodeLabel};
