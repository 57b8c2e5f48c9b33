//! Node implementation for the relationship graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, NodeLabel};
use serde::{Deserialize, Serialize};

/// A node in the relationship graph
///
/// Every node carries exactly one label; its business key lives in the
/// properties named by [`NodeLabel::key_properties`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Node label
    pub label: NodeLabel,

    /// Properties associated with this node
    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    pub fn new(id: NodeId, label: NodeLabel) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Node {
            id,
            label,
            properties: PropertyMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_label(&self, label: NodeLabel) -> bool {
        self.label == label
    }

    /// Set a property value, returning the previous one
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        let old = self.properties.insert(key.into(), value.into());
        self.updated_at = chrono::Utc::now().timestamp_millis();
        old
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// String property or `""` when absent or not a string
    pub fn str_property(&self, key: &str) -> &str {
        self.get_property(key).and_then(PropertyValue::as_string).unwrap_or("")
    }

    /// Numeric property or `0.0` when absent or not numeric
    pub fn float_property(&self, key: &str) -> f64 {
        self.get_property(key).and_then(PropertyValue::as_float).unwrap_or(0.0)
    }

    pub fn display_id(&self) -> String {
        match self.label {
            NodeLabel::User => self.str_property("userId").to_string(),
            NodeLabel::Transaction => self.str_property("transactionId").to_string(),
            NodeLabel::PaymentMethod => self.str_property("paymentMethodId").to_string(),
            NodeLabel::Attribute => self.str_property("value").to_string(),
        }
    }

    /// Human label shown in paths: the business key, or the type for attributes
    pub fn display_label(&self) -> String {
        match self.label {
            NodeLabel::Attribute => self.str_property("attributeType").to_string(),
            _ => self.display_id(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
