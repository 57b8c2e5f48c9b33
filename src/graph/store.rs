//! In-memory relationship graph storage with merge-on-key semantics
//!
//! Nodes and edges live in id-indexed arenas with adjacency lists. Two extra
//! indexes back the merge protocol: one maps (label, business key) to a node,
//! the other maps (kind, endpoints, edge key) to an edge. Merging the same key
//! twice always resolves to the existing element.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyValue;
use super::types::{EdgeId, EdgeKind, NodeId, NodeLabel};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Label {label} expects {expected} key values, got {actual}")]
    KeyArity {
        label: NodeLabel,
        expected: usize,
        actual: usize,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Key parts stay separate so that no pair of distinct values can collide
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    label: NodeLabel,
    key: Box<[String]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    kind: EdgeKind,
    source: NodeId,
    target: NodeId,
    key: Box<[String]>,
}

/// In-memory graph storage
///
/// - nodes / edges: arenas indexed by id (slot 0 unused)
/// - outgoing / incoming: adjacency lists per node
/// - label_index / kind_index: insertion-ordered lookups
/// - node_keys / edge_keys: merge identity lookups
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    label_index: FxHashMap<NodeLabel, Vec<NodeId>>,
    kind_index: FxHashMap<EdgeKind, Vec<EdgeId>>,
    node_keys: FxHashMap<NodeKey, NodeId>,
    edge_keys: FxHashMap<EdgeKey, EdgeId>,
    next_node_id: u64,
    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::with_capacity(1024),
            edges: Vec::with_capacity(4096),
            outgoing: Vec::with_capacity(1024),
            incoming: Vec::with_capacity(1024),
            label_index: FxHashMap::default(),
            kind_index: FxHashMap::default(),
            node_keys: FxHashMap::default(),
            edge_keys: FxHashMap::default(),
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    fn node_key(label: NodeLabel, key_values: &[&str]) -> GraphResult<NodeKey> {
        let expected = label.key_properties().len();
        if key_values.len() != expected {
            return Err(GraphError::KeyArity {
                label,
                expected,
                actual: key_values.len(),
            });
        }
        Ok(NodeKey {
            label,
            key: key_values.iter().map(|v| v.to_string()).collect(),
        })
    }

    /// Look up a node by its business key (values in `key_properties` order)
    pub fn find_node(&self, label: NodeLabel, key_values: &[&str]) -> Option<NodeId> {
        let key = Self::node_key(label, key_values).ok()?;
        self.node_keys.get(&key).copied()
    }

    /// Return the node with this business key, creating it if absent.
    ///
    /// The boolean is `true` when the node was created by this call. A newly
    /// created node carries its key properties and nothing else.
    pub fn merge_node(&mut self, label: NodeLabel, key_values: &[&str]) -> GraphResult<(NodeId, bool)> {
        let key = Self::node_key(label, key_values)?;
        if let Some(id) = self.node_keys.get(&key) {
            return Ok((*id, false));
        }

        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        let idx = id.as_u64() as usize;

        let mut node = Node::new(id, label);
        for (name, value) in label.key_properties().iter().zip(key_values) {
            node.set_property(*name, *value);
        }

        if idx >= self.nodes.len() {
            self.nodes.resize(idx + 1, None);
            self.outgoing.resize(idx + 1, Vec::new());
            self.incoming.resize(idx + 1, Vec::new());
        }
        self.nodes[idx] = Some(node);
        self.label_index.entry(label).or_default().push(id);
        self.node_keys.insert(key, id);
        Ok((id, true))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.as_u64() as usize).and_then(Option::as_mut)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Return the edge with this identity, creating it if absent.
    ///
    /// Identity is (kind, source, target, key values). For direction-free
    /// kinds the endpoints are compared as an unordered pair, so an existing
    /// edge in the opposite direction is returned instead of adding a second.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        key: &[(&str, PropertyValue)],
    ) -> GraphResult<(EdgeId, bool)> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let (a, b) = if kind.is_direction_free() && target < source {
            (target, source)
        } else {
            (source, target)
        };
        let edge_key = EdgeKey {
            kind,
            source: a,
            target: b,
            key: key.iter().map(|(name, value)| format!("{}={}", name, value)).collect(),
        };
        if let Some(id) = self.edge_keys.get(&edge_key) {
            return Ok((*id, false));
        }

        let id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;
        let idx = id.as_u64() as usize;

        let mut edge = Edge::new(id, source, target, kind);
        for (name, value) in key {
            edge.set_property(*name, value.clone());
        }

        if idx >= self.edges.len() {
            self.edges.resize(idx + 1, None);
        }
        self.edges[idx] = Some(edge);
        self.outgoing[source.as_u64() as usize].push(id);
        self.incoming[target.as_u64() as usize].push(id);
        self.kind_index.entry(kind).or_default().push(id);
        self.edge_keys.insert(edge_key, id);
        Ok((id, true))
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.as_u64() as usize).and_then(Option::as_mut)
    }

    /// Edge must exist; used right after a merge returned its id.
    pub fn edge_mut(&mut self, id: EdgeId) -> GraphResult<&mut Edge> {
        self.get_edge_mut(id).ok_or(GraphError::EdgeNotFound(id))
    }

    /// Node must exist; used right after a merge returned its id.
    pub fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(node_id.as_u64() as usize)
            .map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(node_id.as_u64() as usize)
            .map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    /// Outgoing then incoming edges of a node
    pub fn get_incident_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        let mut edges = self.get_outgoing_edges(node_id);
        edges.extend(self.get_incoming_edges(node_id));
        edges
    }

    /// Nodes with a label, in creation order
    pub fn get_nodes_by_label(&self, label: NodeLabel) -> Vec<&Node> {
        self.label_index
            .get(&label)
            .map(|ids| ids.iter().filter_map(|id| self.get_node(*id)).collect())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.node_keys.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_keys.len()
    }

    pub fn label_count(&self, label: NodeLabel) -> usize {
        self.label_index.get(&label).map(Vec::len).unwrap_or(0)
    }

    pub fn kind_count(&self, kind: EdgeKind) -> usize {
        self.kind_index.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_node_is_idempotent() {
        let mut store = GraphStore::new();
        let (first, created) = store.merge_node(NodeLabel::User, &["USR-1"]).unwrap();
        assert!(created);
        let (second, created) = store.merge_node(NodeLabel::User, &["USR-1"]).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get_node(first).unwrap().str_property("userId"), "USR-1");
    }

    #[test]
    fn test_same_key_different_label_is_distinct() {
        let mut store = GraphStore::new();
        let (user, _) = store.merge_node(NodeLabel::User, &["X-1"]).unwrap();
        let (tx, _) = store.merge_node(NodeLabel::Transaction, &["X-1"]).unwrap();
        assert_ne!(user, tx);
        assert_eq!(store.label_count(NodeLabel::User), 1);
        assert_eq!(store.label_count(NodeLabel::Transaction), 1);
    }

    #[test]
    fn test_composite_key() {
        let mut store = GraphStore::new();
        let (a, _) = store.merge_node(NodeLabel::Attribute, &["EMAIL", "h1"]).unwrap();
        let (b, _) = store.merge_node(NodeLabel::Attribute, &["PHONE", "h1"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.find_node(NodeLabel::Attribute, &["EMAIL", "h1"]), Some(a));
        assert_eq!(store.find_node(NodeLabel::Attribute, &["EMAIL", "h2"]), None);

        let err = store.merge_node(NodeLabel::Attribute, &["EMAIL"]).unwrap_err();
        assert_eq!(
            err,
            GraphError::KeyArity { label: NodeLabel::Attribute, expected: 2, actual: 1 }
        );
    }

    #[test]
    fn test_key_parts_with_control_characters_stay_distinct() {
        let mut store = GraphStore::new();
        let (a, created_a) = store.merge_node(NodeLabel::Attribute, &["A\u{1f}B", "C"]).unwrap();
        let (b, created_b) = store.merge_node(NodeLabel::Attribute, &["A", "B\u{1f}C"]).unwrap();
        assert!(created_a && created_b);
        assert_ne!(a, b);
        assert_eq!(store.label_count(NodeLabel::Attribute), 2);
    }

    #[test]
    fn test_merge_edge_by_key() {
        let mut store = GraphStore::new();
        let (u, _) = store.merge_node(NodeLabel::User, &["USR-1"]).unwrap();
        let (t, _) = store.merge_node(NodeLabel::Transaction, &["TX-1"]).unwrap();

        let sender_key = [("transactionId", "TX-1".into()), ("role", "SENDER".into())];
        let receiver_key = [("transactionId", "TX-1".into()), ("role", "RECEIVER".into())];

        let (e1, created) = store.merge_edge(u, t, EdgeKind::ParticipatedIn, &sender_key).unwrap();
        assert!(created);
        let (e2, created) = store.merge_edge(u, t, EdgeKind::ParticipatedIn, &sender_key).unwrap();
        assert!(!created);
        assert_eq!(e1, e2);

        let (e3, created) = store.merge_edge(u, t, EdgeKind::ParticipatedIn, &receiver_key).unwrap();
        assert!(created);
        assert_ne!(e1, e3);
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.get_edge(e1).unwrap().str_property("role"), "SENDER");
        assert_eq!(store.get_outgoing_edges(u).len(), 2);
        assert_eq!(store.get_incoming_edges(t).len(), 2);
    }

    #[test]
    fn test_direction_free_edges_merge_across_directions() {
        let mut store = GraphStore::new();
        let (t1, _) = store.merge_node(NodeLabel::Transaction, &["TX-1"]).unwrap();
        let (t2, _) = store.merge_node(NodeLabel::Transaction, &["TX-2"]).unwrap();
        let key = [("attributeHash", "abc".into()), ("linkType", "IP".into())];

        let (forward, _) = store.merge_edge(t2, t1, EdgeKind::LinkedTo, &key).unwrap();
        let (backward, created) = store.merge_edge(t1, t2, EdgeKind::LinkedTo, &key).unwrap();
        assert!(!created);
        assert_eq!(forward, backward);
        assert_eq!(store.kind_count(EdgeKind::LinkedTo), 1);

        // Directed kinds keep both directions apart
        let (s1, _) = store.merge_edge(t1, t2, EdgeKind::SentTo, &[]).unwrap();
        let (s2, _) = store.merge_edge(t2, t1, EdgeKind::SentTo, &[]).unwrap();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_edge_validation() {
        let mut store = GraphStore::new();
        let (u, _) = store.merge_node(NodeLabel::User, &["USR-1"]).unwrap();
        let missing = NodeId::new(999);

        assert_eq!(
            store.merge_edge(missing, u, EdgeKind::SentTo, &[]).unwrap_err(),
            GraphError::InvalidEdgeSource(missing)
        );
        assert_eq!(
            store.merge_edge(u, missing, EdgeKind::SentTo, &[]).unwrap_err(),
            GraphError::InvalidEdgeTarget(missing)
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_label_index_preserves_creation_order() {
        let mut store = GraphStore::new();
        for id in ["USR-3", "USR-1", "USR-2"] {
            store.merge_node(NodeLabel::User, &[id]).unwrap();
        }
        let ids: Vec<_> = store
            .get_nodes_by_label(NodeLabel::User)
            .iter()
            .map(|n| n.display_id())
            .collect();
        assert_eq!(ids, vec!["USR-3", "USR-1", "USR-2"]);
        assert!(store.get_nodes_by_label(NodeLabel::Transaction).is_empty());
    }
}
