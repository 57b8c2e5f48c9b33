//! Edge implementation for the relationship graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeKind, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge in the relationship graph
///
/// Direction is stored for every edge; whether it matters for merging is a
/// property of the [`EdgeKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    pub kind: EdgeKind,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Edge {
            id,
            source,
            target,
            kind,
            properties: PropertyMap::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// String property or `""` when absent or not a string
    pub fn str_property(&self, key: &str) -> &str {
        self.get_property(key).and_then(PropertyValue::as_string).unwrap_or("")
    }

    /// The endpoint opposite `node`, if `node` is an endpoint at all
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_properties() {
        let mut edge = Edge::new(EdgeId::new(3), NodeId::new(1), NodeId::new(2), EdgeKind::SentTo);
        edge.set_property("transactionId", "TX-9");
        edge.set_property("amount", 120.0);

        assert_eq!(edge.str_property("transactionId"), "TX-9");
        assert_eq!(edge.get_property("amount").and_then(PropertyValue::as_float), Some(120.0));
        assert_eq!(edge.str_property("currency"), "");
    }

    #[test]
    fn test_edge_endpoints() {
        let edge = Edge::new(EdgeId::new(5), NodeId::new(10), NodeId::new(20), EdgeKind::LinkedTo);

        assert_eq!(edge.other_end(NodeId::new(10)), Some(NodeId::new(20)));
        assert_eq!(edge.other_end(NodeId::new(20)), Some(NodeId::new(10)));
        assert_eq!(edge.other_end(NodeId::new(30)), None);
    }
}
