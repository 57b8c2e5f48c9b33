//! Read-side views of the relationship graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-to-user edge created by a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectUserLink {
    pub user_id: String,
    /// `SENT_TO` or `RECEIVED_FROM`
    pub link_type: String,
    /// `OUTBOUND` or `INBOUND`
    pub direction: String,
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTransactionLink {
    pub transaction_id: String,
    pub role: String,
    pub amount: f64,
    pub currency: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Other users holding the same attribute fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedAttributeLink {
    pub attribute_type: String,
    pub attribute_hash: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRelationships {
    pub user_id: String,
    pub direct_links: Vec<DirectUserLink>,
    pub transactions: Vec<UserTransactionLink>,
    pub shared_attributes: Vec<SharedAttributeLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUserLink {
    pub user_id: String,
    pub role: String,
    pub amount: f64,
    pub currency: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedTransaction {
    pub transaction_id: String,
    pub link_type: String,
    pub attribute_hash: String,
    pub score: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRelationships {
    pub transaction_id: String,
    pub users: Vec<TransactionUserLink>,
    pub linked_transactions: Vec<LinkedTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEdge {
    #[serde(rename = "type")]
    pub edge_type: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub weight: f64,
}

/// Path between two users. `hops` is `None` when no path exists within the bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortestPath {
    pub source_user_id: String,
    pub target_user_id: String,
    pub nodes: Vec<PathNode>,
    pub edges: Vec<PathEdge>,
    pub hops: Option<usize>,
}

impl ShortestPath {
    /// Zero-hop path from a user to itself
    pub fn trivial(user_id: &str) -> Self {
        ShortestPath {
            source_user_id: user_id.to_string(),
            target_user_id: user_id.to_string(),
            nodes: vec![PathNode {
                id: user_id.to_string(),
                node_type: "User".to_string(),
                label: user_id.to_string(),
                weight: 1.0,
            }],
            edges: Vec::new(),
            hops: Some(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
