//! Identifier, label and relationship-type definitions for the relationship graph
//!
//! The persisted schema is closed: four node labels and seven relationship
//! types. Their string forms are the on-store names and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node inside the in-process store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Unique identifier for an edge inside the in-process store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Node label. Each label has a fixed merge key (see [`NodeLabel::key_properties`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum NodeLabel {
    User,
    Transaction,
    Attribute,
    PaymentMethod,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::User => "User",
            NodeLabel::Transaction => "Transaction",
            NodeLabel::Attribute => "Attribute",
            NodeLabel::PaymentMethod => "PaymentMethod",
        }
    }

    /// Property names forming the merge identity of a node with this label
    pub fn key_properties(&self) -> &'static [&'static str] {
        match self {
            NodeLabel::User => &["userId"],
            NodeLabel::Transaction => &["transactionId"],
            NodeLabel::Attribute => &["attributeType", "value"],
            NodeLabel::PaymentMethod => &["paymentMethodId"],
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum EdgeKind {
    /// User -> Transaction, keyed by (transactionId, role)
    ParticipatedIn,
    /// sender User -> receiver User, keyed by transactionId
    SentTo,
    /// receiver User -> sender User, keyed by transactionId
    ReceivedFrom,
    /// User or Transaction -> Attribute
    HasAttribute,
    /// Transaction <-> Transaction, keyed by (attributeHash, linkType), direction-free
    LinkedTo,
    /// User -> PaymentMethod
    UsesPaymentMethod,
    /// Transaction -> PaymentMethod
    PaymentMethodRelates,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 7] = [
        EdgeKind::ParticipatedIn,
        EdgeKind::SentTo,
        EdgeKind::ReceivedFrom,
        EdgeKind::HasAttribute,
        EdgeKind::LinkedTo,
        EdgeKind::UsesPaymentMethod,
        EdgeKind::PaymentMethodRelates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::ParticipatedIn => "PARTICIPATED_IN",
            EdgeKind::SentTo => "SENT_TO",
            EdgeKind::ReceivedFrom => "RECEIVED_FROM",
            EdgeKind::HasAttribute => "HAS_ATTRIBUTE",
            EdgeKind::LinkedTo => "LINKED_TO",
            EdgeKind::UsesPaymentMethod => "USES_PAYMENT_METHOD",
            EdgeKind::PaymentMethodRelates => "PAYMENT_METHOD_RELATES",
        }
    }

    /// Linkage edges are merged regardless of which endpoint is the source.
    pub fn is_direction_free(&self) -> bool {
        matches!(self, EdgeKind::LinkedTo)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
