//! EmbeddedClient: in-process graph store client
//!
//! Interprets [`Statement`]s directly against a [`GraphStore`], with the
//! same row shapes and column names as the Cypher the remote client sends.
//! Each statement runs under a single lock acquisition, so writes are atomic
//! with respect to other statements.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::algo::bounded_shortest_path;
use crate::graph::{Edge, EdgeKind, GraphStore, Node, NodeId, NodeLabel, PropertyValue};
use crate::query::{sort, Statement, TransactionQuery, TransactionWrite, UserQuery, UserWrite};

use super::error::{ClientError, ClientResult};
use super::models::{QueryResult, Record};
use super::GraphClient;

const SENDER: &str = "SENDER";
const RECEIVER: &str = "RECEIVER";

/// In-process client that wraps a GraphStore directly.
pub struct EmbeddedClient {
    store: Arc<RwLock<GraphStore>>,
    closed: AtomicBool,
}

impl EmbeddedClient {
    /// Create a new EmbeddedClient with a fresh empty graph store
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(GraphStore::new())))
    }

    /// Create an EmbeddedClient wrapping an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Acquire a read lock on the store for direct inspection
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ClientError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for EmbeddedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphClient for EmbeddedClient {
    async fn execute_write(&self, statement: &Statement) -> ClientResult<QueryResult> {
        self.ensure_open()?;
        let mut store = self.store.write().await;
        debug!(statement = statement.name(), "embedded write");
        match statement {
            Statement::UpsertUser(w) => upsert_user(&mut store, w),
            Statement::UpsertTransaction(w) => upsert_transaction(&mut store, w),
            other => Err(ClientError::WrongAccessMode(other.name(), "write")),
        }
    }

    async fn execute_read(&self, statement: &Statement) -> ClientResult<QueryResult> {
        self.ensure_open()?;
        let store = self.store.read().await;
        debug!(statement = statement.name(), "embedded read");
        let result = match statement {
            Statement::UpsertUser(_) | Statement::UpsertTransaction(_) => {
                return Err(ClientError::WrongAccessMode(statement.name(), "read"))
            }
            Statement::UserDirectLinks { user_id } => user_direct_links(&store, user_id),
            Statement::UserTransactions { user_id } => user_transactions(&store, user_id),
            Statement::UserSharedAttributes { user_id } => user_shared_attributes(&store, user_id),
            Statement::TransactionUsers { transaction_id } => transaction_users(&store, transaction_id),
            Statement::LinkedTransactions { transaction_id } => linked_transactions(&store, transaction_id),
            Statement::ShortestPath { source_id, target_id, max_hops } => {
                shortest_path(&store, source_id, target_id, *max_hops as usize)
            }
            Statement::ListUsers(q) => list_users(&store, q),
            Statement::CountUsers(filter) => {
                let total = store
                    .get_nodes_by_label(NodeLabel::User)
                    .into_iter()
                    .filter(|u| filter.matches(u))
                    .count();
                QueryResult::new(&["total"], vec![Record::new().with("total", total as u64)])
            }
            Statement::ListTransactions(q) => list_transactions(&store, q),
            Statement::CountTransactions(filter) => {
                let total = store
                    .get_nodes_by_label(NodeLabel::Transaction)
                    .into_iter()
                    .filter(|t| filter.matches(t, &participants(&store, t.id)))
                    .count();
                QueryResult::new(&["total"], vec![Record::new().with("total", total as u64)])
            }
            Statement::ExportUsers => export_users(&store),
            Statement::ExportTransactions => export_transactions(&store),
            Statement::Ping => QueryResult::new(&["ok"], vec![Record::new().with("ok", 1)]),
        };
        Ok(result)
    }

    async fn verify_connectivity(&self) -> ClientResult<()> {
        self.ensure_open()
    }

    async fn close(&self) -> ClientResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn set_edge_props(store: &mut GraphStore, edge: crate::graph::EdgeId, props: &[(&str, PropertyValue)]) -> ClientResult<()> {
    let edge = store.edge_mut(edge)?;
    for (key, value) in props {
        edge.set_property(*key, value.clone());
    }
    Ok(())
}

fn upsert_user(store: &mut GraphStore, w: &UserWrite) -> ClientResult<QueryResult> {
    let (user, _) = store.merge_node(NodeLabel::User, &[w.user_id.as_str()])?;
    {
        let node = store.node_mut(user)?;
        for (key, value) in &w.props {
            node.set_property(key.as_str(), value.clone());
        }
    }

    for attr in &w.attributes {
        let (a, _) = store.merge_node(
            NodeLabel::Attribute,
            &[attr.attribute_type.as_str(), attr.value.as_str()],
        )?;
        store.node_mut(a)?.set_property("rawValue", attr.raw_value.as_str());
        let (edge, _) = store.merge_edge(user, a, EdgeKind::HasAttribute, &[])?;
        set_edge_props(store, edge, &[("confidenceScore", attr.confidence.into())])?;
    }

    for pm in &w.payment_methods {
        let (p, _) = store.merge_node(NodeLabel::PaymentMethod, &[pm.id.as_str()])?;
        {
            let node = store.node_mut(p)?;
            for (key, value) in &pm.props {
                node.set_property(key.as_str(), value.clone());
            }
        }
        let (edge, _) = store.merge_edge(user, p, EdgeKind::UsesPaymentMethod, &[])?;
        set_edge_props(
            store,
            edge,
            &[
                ("firstUsedAt", pm.first_used_at.as_str().into()),
                ("lastUsedAt", pm.last_used_at.as_str().into()),
            ],
        )?;
    }

    Ok(QueryResult::new(
        &["userId"],
        vec![Record::new().with("userId", w.user_id.as_str())],
    ))
}

fn upsert_transaction(store: &mut GraphStore, w: &TransactionWrite) -> ClientResult<QueryResult> {
    let sender = store.find_node(NodeLabel::User, &[w.sender_id.as_str()]);
    let receiver = store.find_node(NodeLabel::User, &[w.receiver_id.as_str()]);
    let (sender, receiver) = match (sender, receiver) {
        (Some(s), Some(r)) => (s, r),
        // Nothing matched, nothing written
        _ => return Ok(QueryResult::new(&["transactionId"], Vec::new())),
    };

    let (tx, _) = store.merge_node(NodeLabel::Transaction, &[w.transaction_id.as_str()])?;
    {
        let node = store.node_mut(tx)?;
        for (key, value) in &w.props {
            node.set_property(key.as_str(), value.clone());
        }
    }

    let money: [(&str, PropertyValue); 3] = [
        ("amount", w.amount.into()),
        ("currency", w.currency.as_str().into()),
        ("timestamp", w.timestamp.as_str().into()),
    ];

    for (user, role) in [(sender, SENDER), (receiver, RECEIVER)] {
        let key = [
            ("transactionId", PropertyValue::from(w.transaction_id.as_str())),
            ("role", PropertyValue::from(role)),
        ];
        let (edge, _) = store.merge_edge(user, tx, EdgeKind::ParticipatedIn, &key)?;
        set_edge_props(store, edge, &money)?;
    }

    let transfer_key = [("transactionId", PropertyValue::from(w.transaction_id.as_str()))];
    let (sent, _) = store.merge_edge(sender, receiver, EdgeKind::SentTo, &transfer_key)?;
    set_edge_props(store, sent, &money)?;
    let (received, _) = store.merge_edge(receiver, sender, EdgeKind::ReceivedFrom, &transfer_key)?;
    set_edge_props(store, received, &money)?;

    for attr in &w.attributes {
        let (a, _) = store.merge_node(
            NodeLabel::Attribute,
            &[attr.attribute_type.as_str(), attr.value.as_str()],
        )?;
        store.node_mut(a)?.set_property("rawValue", attr.raw_value.as_str());
        let (edge, _) = store.merge_edge(tx, a, EdgeKind::HasAttribute, &[])?;
        set_edge_props(store, edge, &[("origin", "TRANSACTION".into())])?;

        let mut others: Vec<NodeId> = store
            .get_incoming_edges(a)
            .into_iter()
            .filter(|e| e.kind == EdgeKind::HasAttribute)
            .filter_map(|e| store.get_node(e.source))
            .filter(|n| n.has_label(NodeLabel::Transaction))
            .filter(|n| n.str_property("transactionId") != w.transaction_id)
            .map(|n| n.id)
            .collect();
        others.dedup();

        let link_key = [
            ("attributeHash", PropertyValue::from(attr.value.as_str())),
            ("linkType", PropertyValue::from(attr.attribute_type.as_str())),
        ];
        for other in others {
            let (link, _) = store.merge_edge(tx, other, EdgeKind::LinkedTo, &link_key)?;
            set_edge_props(
                store,
                link,
                &[
                    ("score", attr.score.into()),
                    ("updatedAt", w.linked_at.as_str().into()),
                ],
            )?;
        }
    }

    if !w.payment_method_id.is_empty() {
        if let Some(pm) = store.find_node(NodeLabel::PaymentMethod, &[w.payment_method_id.as_str()]) {
            let (edge, _) = store.merge_edge(tx, pm, EdgeKind::PaymentMethodRelates, &[])?;
            set_edge_props(store, edge, &[("role", SENDER.into())])?;
        }
    }

    Ok(QueryResult::new(
        &["transactionId"],
        vec![Record::new().with("transactionId", w.transaction_id.as_str())],
    ))
}

fn node_prop(node: &Node, key: &str) -> Value {
    node.get_property(key).map(PropertyValue::to_json).unwrap_or(Value::Null)
}

fn edge_prop(edge: &Edge, key: &str) -> Value {
    edge.get_property(key).map(PropertyValue::to_json).unwrap_or(Value::Null)
}

fn find_user(store: &GraphStore, user_id: &str) -> Option<NodeId> {
    store.find_node(NodeLabel::User, &[user_id])
}

fn find_transaction(store: &GraphStore, transaction_id: &str) -> Option<NodeId> {
    store.find_node(NodeLabel::Transaction, &[transaction_id])
}

fn user_direct_links(store: &GraphStore, user_id: &str) -> QueryResult {
    let columns = ["peerId", "linkType", "direction", "transactionId", "amount", "currency", "timestamp"];
    let Some(user) = find_user(store, user_id) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let records = store
        .get_outgoing_edges(user)
        .into_iter()
        .filter(|e| matches!(e.kind, EdgeKind::SentTo | EdgeKind::ReceivedFrom))
        .filter_map(|e| {
            let peer = store.get_node(e.target).filter(|n| n.has_label(NodeLabel::User))?;
            let direction = if e.kind == EdgeKind::SentTo { "OUTBOUND" } else { "INBOUND" };
            Some(
                Record::new()
                    .with("peerId", node_prop(peer, "userId"))
                    .with("linkType", e.kind.as_str())
                    .with("direction", direction)
                    .with("transactionId", edge_prop(e, "transactionId"))
                    .with("amount", edge_prop(e, "amount"))
                    .with("currency", edge_prop(e, "currency"))
                    .with("timestamp", edge_prop(e, "timestamp")),
            )
        })
        .collect();
    QueryResult::new(&columns, records)
}

fn user_transactions(store: &GraphStore, user_id: &str) -> QueryResult {
    let columns = ["transactionId", "role", "amount", "currency", "timestamp"];
    let Some(user) = find_user(store, user_id) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let records = store
        .get_outgoing_edges(user)
        .into_iter()
        .filter(|e| e.kind == EdgeKind::ParticipatedIn)
        .filter_map(|e| {
            let tx = store.get_node(e.target).filter(|n| n.has_label(NodeLabel::Transaction))?;
            Some(
                Record::new()
                    .with("transactionId", node_prop(tx, "transactionId"))
                    .with("role", edge_prop(e, "role"))
                    .with("amount", node_prop(tx, "amount"))
                    .with("currency", node_prop(tx, "currency"))
                    .with("timestamp", node_prop(tx, "timestamp")),
            )
        })
        .collect();
    QueryResult::new(&columns, records)
}

fn user_shared_attributes(store: &GraphStore, user_id: &str) -> QueryResult {
    let columns = ["attributeType", "attributeHash", "userIds"];
    let Some(user) = find_user(store, user_id) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let mut records = Vec::new();
    for edge in store.get_outgoing_edges(user) {
        if edge.kind != EdgeKind::HasAttribute {
            continue;
        }
        let Some(attr) = store.get_node(edge.target) else {
            continue;
        };
        let mut user_ids: Vec<String> = Vec::new();
        for holder in store.get_incoming_edges(attr.id) {
            if holder.kind != EdgeKind::HasAttribute {
                continue;
            }
            let Some(other) = store.get_node(holder.source) else {
                continue;
            };
            let other_id = other.str_property("userId");
            if other.has_label(NodeLabel::User) && other_id != user_id && !user_ids.iter().any(|u| u == other_id) {
                user_ids.push(other_id.to_string());
            }
        }
        if user_ids.is_empty() {
            continue;
        }
        records.push(
            Record::new()
                .with("attributeType", node_prop(attr, "attributeType"))
                .with("attributeHash", node_prop(attr, "value"))
                .with("userIds", json!(user_ids)),
        );
    }
    QueryResult::new(&columns, records)
}

fn transaction_users(store: &GraphStore, transaction_id: &str) -> QueryResult {
    let columns = ["userId", "role", "amount", "currency", "direction"];
    let Some(tx) = find_transaction(store, transaction_id) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let records = store
        .get_incoming_edges(tx)
        .into_iter()
        .filter(|e| e.kind == EdgeKind::ParticipatedIn)
        .filter_map(|e| {
            let user = store.get_node(e.source).filter(|n| n.has_label(NodeLabel::User))?;
            let direction = if e.str_property("role") == SENDER { "OUTBOUND" } else { "INBOUND" };
            Some(
                Record::new()
                    .with("userId", node_prop(user, "userId"))
                    .with("role", edge_prop(e, "role"))
                    .with("amount", edge_prop(e, "amount"))
                    .with("currency", edge_prop(e, "currency"))
                    .with("direction", direction),
            )
        })
        .collect();
    QueryResult::new(&columns, records)
}

fn linked_transactions(store: &GraphStore, transaction_id: &str) -> QueryResult {
    let columns = ["otherTransactionId", "linkType", "attributeHash", "score", "updatedAt"];
    let Some(tx) = find_transaction(store, transaction_id) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let records = store
        .get_incident_edges(tx)
        .into_iter()
        .filter(|e| e.kind == EdgeKind::LinkedTo)
        .filter_map(|e| {
            let other = store
                .get_node(e.other_end(tx)?)
                .filter(|n| n.has_label(NodeLabel::Transaction))?;
            Some(
                Record::new()
                    .with("otherTransactionId", node_prop(other, "transactionId"))
                    .with("linkType", edge_prop(e, "linkType"))
                    .with("attributeHash", edge_prop(e, "attributeHash"))
                    .with("score", edge_prop(e, "score"))
                    .with("updatedAt", edge_prop(e, "updatedAt")),
            )
        })
        .collect();
    QueryResult::new(&columns, records)
}

fn shortest_path(store: &GraphStore, source_id: &str, target_id: &str, max_hops: usize) -> QueryResult {
    let columns = ["nodes", "edges", "hops"];
    let (Some(source), Some(target)) = (find_user(store, source_id), find_user(store, target_id)) else {
        return QueryResult::new(&columns, Vec::new());
    };
    let Some(path) = bounded_shortest_path(store, source, target, &EdgeKind::ALL, max_hops) else {
        return QueryResult::new(&columns, Vec::new());
    };

    let display_id = |id: NodeId| store.get_node(id).map(|n| n.display_id()).unwrap_or_default();

    let nodes: Vec<Value> = path
        .nodes
        .iter()
        .filter_map(|id| store.get_node(*id))
        .map(|n| {
            json!({
                "id": n.display_id(),
                "label": n.display_label(),
                "type": n.label.as_str(),
                "weight": 1.0,
            })
        })
        .collect();
    let edges: Vec<Value> = path
        .edges
        .iter()
        .filter_map(|id| store.get_edge(*id))
        .map(|e| {
            json!({
                "type": e.kind.as_str(),
                "sourceId": display_id(e.source),
                "targetId": display_id(e.target),
                "label": e.kind.as_str(),
                "weight": 1.0,
            })
        })
        .collect();

    QueryResult::new(
        &columns,
        vec![Record::new()
            .with("nodes", Value::Array(nodes))
            .with("edges", Value::Array(edges))
            .with("hops", path.hops() as u64)],
    )
}

const USER_SUMMARY_COLUMNS: [&str; 8] = [
    "userId", "fullName", "email", "phone", "kycStatus", "riskScore", "createdAt", "updatedAt",
];

const TRANSACTION_SUMMARY_COLUMNS: [&str; 11] = [
    "transactionId", "amount", "currency", "type", "status", "channel", "timestamp", "createdAt",
    "updatedAt", "senderId", "receiverId",
];

fn user_summary(user: &Node) -> Record {
    USER_SUMMARY_COLUMNS
        .iter()
        .fold(Record::new(), |record, column| record.with(column, node_prop(user, column)))
}

/// Users with a participation edge into `tx`
fn participants(store: &GraphStore, tx: NodeId) -> Vec<&Node> {
    store
        .get_incoming_edges(tx)
        .into_iter()
        .filter(|e| e.kind == EdgeKind::ParticipatedIn)
        .filter_map(|e| store.get_node(e.source))
        .filter(|n| n.has_label(NodeLabel::User))
        .collect()
}

fn participant_with_role(store: &GraphStore, tx: NodeId, role: &str) -> Value {
    store
        .get_incoming_edges(tx)
        .into_iter()
        .filter(|e| e.kind == EdgeKind::ParticipatedIn && e.str_property("role") == role)
        .filter_map(|e| store.get_node(e.source))
        .find(|n| n.has_label(NodeLabel::User))
        .map(|n| node_prop(n, "userId"))
        .unwrap_or(Value::Null)
}

fn transaction_summary(store: &GraphStore, tx: &Node) -> Record {
    TRANSACTION_SUMMARY_COLUMNS[..9]
        .iter()
        .fold(Record::new(), |record, column| record.with(column, node_prop(tx, column)))
        .with("senderId", participant_with_role(store, tx.id, SENDER))
        .with("receiverId", participant_with_role(store, tx.id, RECEIVER))
}

fn list_users(store: &GraphStore, q: &UserQuery) -> QueryResult {
    let mut users: Vec<&Node> = store
        .get_nodes_by_label(NodeLabel::User)
        .into_iter()
        .filter(|u| q.filter.matches(u))
        .collect();
    users.sort_by(|a, b| sort::compare_users(a, b, q.sort, q.order));
    let records = users
        .into_iter()
        .skip(q.skip)
        .take(q.limit)
        .map(user_summary)
        .collect();
    QueryResult::new(&USER_SUMMARY_COLUMNS, records)
}

fn list_transactions(store: &GraphStore, q: &TransactionQuery) -> QueryResult {
    let mut txs: Vec<&Node> = store
        .get_nodes_by_label(NodeLabel::Transaction)
        .into_iter()
        .filter(|t| q.filter.matches(t, &participants(store, t.id)))
        .collect();
    txs.sort_by(|a, b| sort::compare_transactions(a, b, q.sort, q.order));
    let records = txs
        .into_iter()
        .skip(q.skip)
        .take(q.limit)
        .map(|t| transaction_summary(store, t))
        .collect();
    QueryResult::new(&TRANSACTION_SUMMARY_COLUMNS, records)
}

fn export_users(store: &GraphStore) -> QueryResult {
    let mut users = store.get_nodes_by_label(NodeLabel::User);
    users.sort_by(|a, b| a.str_property("userId").cmp(b.str_property("userId")));
    QueryResult::new(&USER_SUMMARY_COLUMNS, users.into_iter().map(user_summary).collect())
}

fn export_transactions(store: &GraphStore) -> QueryResult {
    let mut txs = store.get_nodes_by_label(NodeLabel::Transaction);
    txs.sort_by(|a, b| {
        sort::compare_transactions(a, b, crate::model::TransactionSortField::Timestamp, crate::model::SortOrder::Desc)
    });
    let records = txs.into_iter().map(|t| transaction_summary(store, t)).collect();
    QueryResult::new(&TRANSACTION_SUMMARY_COLUMNS, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;
    use crate::query::AttributeParam;

    fn user_write(id: &str, attrs: Vec<AttributeParam>) -> Statement {
        let mut props = PropertyMap::new();
        props.insert("fullName".to_string(), format!("Name {}", id).into());
        Statement::UpsertUser(UserWrite {
            user_id: id.to_string(),
            props,
            attributes: attrs,
            payment_methods: Vec::new(),
        })
    }

    fn tx_write(id: &str, sender: &str, receiver: &str, attrs: Vec<AttributeParam>) -> Statement {
        Statement::UpsertTransaction(TransactionWrite {
            transaction_id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            amount: 100.0,
            currency: "USD".to_string(),
            timestamp: "2024-04-20T12:00:00Z".to_string(),
            props: PropertyMap::new(),
            attributes: attrs,
            payment_method_id: String::new(),
            linked_at: "2024-04-20T12:00:00Z".to_string(),
        })
    }

    fn ip(value: &str) -> AttributeParam {
        AttributeParam {
            attribute_type: "IP".to_string(),
            value: value.to_string(),
            raw_value: value.to_string(),
            confidence: 0.85,
            score: 0.85,
        }
    }

    #[tokio::test]
    async fn test_transaction_requires_participants() {
        let client = EmbeddedClient::new();
        client.execute_write(&user_write("USR-1", vec![])).await.unwrap();

        let result = client.execute_write(&tx_write("TX-1", "USR-1", "USR-2", vec![])).await.unwrap();
        assert!(result.is_empty());

        let store = client.store_read().await;
        assert_eq!(store.label_count(NodeLabel::Transaction), 0);
        assert_eq!(store.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_linked_transactions_either_direction() {
        let client = EmbeddedClient::new();
        for id in ["USR-1", "USR-2"] {
            client.execute_write(&user_write(id, vec![])).await.unwrap();
        }
        client.execute_write(&tx_write("TX-1", "USR-1", "USR-2", vec![ip("h1")])).await.unwrap();
        client.execute_write(&tx_write("TX-2", "USR-2", "USR-1", vec![ip("h1")])).await.unwrap();

        for (tx, other) in [("TX-1", "TX-2"), ("TX-2", "TX-1")] {
            let result = client
                .execute_read(&Statement::LinkedTransactions { transaction_id: tx.to_string() })
                .await
                .unwrap();
            assert_eq!(result.len(), 1);
            let row = &result.records[0];
            assert_eq!(row.string("otherTransactionId"), other);
            assert_eq!(row.string("linkType"), "IP");
            assert_eq!(row.float("score"), 0.85);
        }
    }

    #[tokio::test]
    async fn test_access_modes_and_close() {
        let client = EmbeddedClient::new();
        let err = client.execute_write(&Statement::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::WrongAccessMode("ping", "write")));
        let err = client.execute_read(&user_write("USR-1", vec![])).await.unwrap_err();
        assert!(matches!(err, ClientError::WrongAccessMode("upsert_user", "read")));

        let ping = client.execute_read(&Statement::Ping).await.unwrap();
        assert_eq!(ping.first().and_then(|r| r.int("ok")), Some(1));

        client.close().await.unwrap();
        assert!(matches!(client.verify_connectivity().await, Err(ClientError::Closed)));
        assert!(matches!(client.execute_read(&Statement::Ping).await, Err(ClientError::Closed)));
    }

    #[tokio::test]
    async fn test_shared_attributes_exclude_self() {
        let client = EmbeddedClient::new();
        client.execute_write(&user_write("USR-1", vec![ip("shared"), ip("solo")])).await.unwrap();
        client.execute_write(&user_write("USR-2", vec![ip("shared")])).await.unwrap();
        client.execute_write(&user_write("USR-3", vec![ip("shared")])).await.unwrap();

        let result = client
            .execute_read(&Statement::UserSharedAttributes { user_id: "USR-1".to_string() })
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.records[0].string("attributeHash"), "shared");
        assert_eq!(result.records[0].string_list("userIds"), vec!["USR-2", "USR-3"]);
    }
}
