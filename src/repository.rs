//! Graph repository: typed statements in, typed views out
//!
//! [`Repository`] turns domain entities into merge-on-key write statements
//! and decodes read results into relationship views. Every write is a single
//! statement, so each upsert is applied atomically by the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::client::models::{to_f64, to_string};
use crate::client::{ClientError, GraphClient, QueryResult, Record};
use crate::error::{EngineError, EngineResult};
use crate::graph::PropertyMap;
use crate::model::{
    format_time, Attribute, DirectUserLink, LinkedTransaction, PathEdge, PathNode, PaymentMethod,
    SharedAttributeLink, ShortestPath, Transaction, TransactionListResult, TransactionRelationships,
    TransactionSummary, TransactionUserLink, User, UserListResult, UserRelationships, UserSummary,
    UserTransactionLink,
};
use crate::query::{
    AttributeParam, PaymentMethodParam, Statement, TransactionQuery, TransactionWrite, UserQuery,
    UserWrite, MAX_PATH_HOPS,
};

/// Time source used to stamp derived edges
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Persistence capability consumed by the service layer
#[async_trait]
pub trait GraphRepository: Send + Sync {
    async fn upsert_user(&self, user: &User) -> EngineResult<()>;
    async fn upsert_transaction(&self, tx: &Transaction, attributes: &[Attribute]) -> EngineResult<()>;
    async fn fetch_user_relationships(&self, user_id: &str) -> EngineResult<UserRelationships>;
    async fn fetch_transaction_relationships(&self, transaction_id: &str) -> EngineResult<TransactionRelationships>;
    async fn shortest_path_between_users(&self, source_id: &str, target_id: &str) -> EngineResult<ShortestPath>;
    async fn export_users(&self) -> EngineResult<Vec<UserSummary>>;
    async fn export_transactions(&self) -> EngineResult<Vec<TransactionSummary>>;
    async fn list_users(&self, query: &UserQuery) -> EngineResult<UserListResult>;
    async fn list_transactions(&self, query: &TransactionQuery) -> EngineResult<TransactionListResult>;
}

/// Repository backed by any [`GraphClient`]
pub struct Repository {
    client: Arc<dyn GraphClient>,
    clock: Clock,
}

impl Repository {
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self {
            client,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn read(&self, key: &str, statement: Statement) -> EngineResult<QueryResult> {
        self.client
            .execute_read(&statement)
            .await
            .map_err(|e| EngineError::store(key, e))
    }

    async fn write(&self, key: &str, statement: Statement) -> EngineResult<QueryResult> {
        self.client
            .execute_write(&statement)
            .await
            .map_err(|e| EngineError::store(key, e))
    }
}

fn attribute_params(attrs: &[Attribute]) -> Vec<AttributeParam> {
    attrs
        .iter()
        .map(|a| AttributeParam {
            attribute_type: a.attribute_type.clone(),
            value: a.value.clone(),
            raw_value: a.raw_value.clone(),
            confidence: a.confidence_score,
            score: a.confidence_score,
        })
        .collect()
}

fn payment_method_params(methods: &[PaymentMethod]) -> Vec<PaymentMethodParam> {
    methods
        .iter()
        .map(|pm| {
            let mut props = PropertyMap::new();
            props.insert("methodType".to_string(), pm.method_type.as_str().into());
            props.insert("provider".to_string(), pm.provider.as_str().into());
            props.insert("masked".to_string(), pm.masked.as_str().into());
            props.insert("fingerprint".to_string(), pm.fingerprint.as_str().into());
            PaymentMethodParam {
                id: pm.id.clone(),
                props,
                first_used_at: format_time(pm.first_used_at.as_ref()),
                last_used_at: format_time(pm.last_used_at.as_ref()),
            }
        })
        .collect()
}

/// Scalar properties written onto the User node
fn user_properties(user: &User) -> PropertyMap {
    let mut props = PropertyMap::new();
    let mut put = |key: &str, value: crate::graph::PropertyValue| {
        props.insert(key.to_string(), value);
    };
    put("fullName", user.full_name.as_str().into());
    put("email", user.email.as_str().into());
    put("phone", user.phone.as_str().into());
    put("kycStatus", user.kyc_status.as_str().into());
    put("riskScore", user.risk_score.into());
    put("updatedAt", format_time(Some(&user.updated_at)).into());
    if let Some(created) = &user.created_at {
        put("createdAt", format_time(Some(created)).into());
    }
    if let Some(dob) = &user.date_of_birth {
        put("dateOfBirth", format_time(Some(dob)).into());
    }
    put("addressLine1", user.address.line1.as_str().into());
    put("addressLine2", user.address.line2.as_str().into());
    put("addressCity", user.address.city.as_str().into());
    put("addressState", user.address.state.as_str().into());
    put("addressPostalCode", user.address.postal_code.as_str().into());
    put("addressCountry", user.address.country.as_str().into());
    props
}

/// Scalar properties written onto the Transaction node
fn transaction_properties(tx: &Transaction) -> EngineResult<PropertyMap> {
    let mut props = PropertyMap::new();
    let mut put = |key: &str, value: crate::graph::PropertyValue| {
        props.insert(key.to_string(), value);
    };
    put("amount", tx.amount.into());
    put("currency", tx.currency.as_str().into());
    put("type", tx.tx_type.as_str().into());
    put("status", tx.status.as_str().into());
    put("channel", tx.channel.as_str().into());
    put("ipAddress", tx.ip_address.as_str().into());
    put("deviceId", tx.device_id.as_str().into());
    put("paymentMethodId", tx.payment_method_id.as_str().into());
    put("timestamp", format_time(Some(&tx.timestamp)).into());
    put("updatedAt", format_time(Some(&tx.updated_at)).into());
    if let Some(created) = &tx.created_at {
        put("createdAt", format_time(Some(created)).into());
    }
    // Stores hold scalars only, so metadata travels as a JSON string
    if let Some(metadata) = tx.metadata.as_ref().filter(|m| !m.is_empty()) {
        let serialized = serde_json::to_string(metadata).map_err(|e| {
            EngineError::validation(format!("transaction {} metadata: {}", tx.id, e))
        })?;
        put("metadataJson", serialized.into());
    }
    Ok(props)
}

fn user_summary(record: &Record) -> UserSummary {
    UserSummary {
        id: record.string("userId"),
        full_name: record.string("fullName"),
        email: record.string("email"),
        phone: record.string("phone"),
        kyc_status: record.string("kycStatus"),
        risk_score: record.float("riskScore"),
        created_at: record.time("createdAt"),
        updated_at: record.time("updatedAt"),
    }
}

fn transaction_summary(record: &Record) -> TransactionSummary {
    TransactionSummary {
        id: record.string("transactionId"),
        sender_user_id: record.string("senderId"),
        receiver_user_id: record.string("receiverId"),
        amount: record.float("amount"),
        currency: record.string("currency"),
        tx_type: record.string("type"),
        status: record.string("status"),
        channel: record.string("channel"),
        timestamp: record.time("timestamp"),
        created_at: record.time("createdAt"),
        updated_at: record.time("updatedAt"),
    }
}

fn count(result: &QueryResult) -> u64 {
    result
        .first()
        .and_then(|r| r.int("total"))
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}

fn path_field<'a>(entry: &'a Value, key: &str) -> &'a Value {
    entry.get(key).unwrap_or(&Value::Null)
}

fn decode_path(source_id: &str, target_id: &str, result: &QueryResult) -> ShortestPath {
    let mut path = ShortestPath {
        source_user_id: source_id.to_string(),
        target_user_id: target_id.to_string(),
        ..Default::default()
    };
    let Some(record) = result.first() else {
        return path;
    };

    path.nodes = record
        .list("nodes")
        .iter()
        .filter(|n| n.is_object())
        .map(|n| PathNode {
            id: to_string(path_field(n, "id")),
            node_type: to_string(path_field(n, "type")),
            label: to_string(path_field(n, "label")),
            weight: to_f64(path_field(n, "weight")),
        })
        .collect();
    path.edges = record
        .list("edges")
        .iter()
        .filter(|e| e.is_object())
        .map(|e| PathEdge {
            edge_type: to_string(path_field(e, "type")),
            source: to_string(path_field(e, "sourceId")),
            target: to_string(path_field(e, "targetId")),
            label: to_string(path_field(e, "label")),
            weight: to_f64(path_field(e, "weight")),
        })
        .collect();
    path.hops = record.int("hops").map(|h| h.max(0) as usize);
    path
}

#[async_trait]
impl GraphRepository for Repository {
    async fn upsert_user(&self, user: &User) -> EngineResult<()> {
        if user.id.is_empty() {
            return Err(EngineError::validation("user id is required"));
        }

        let statement = Statement::UpsertUser(UserWrite {
            user_id: user.id.clone(),
            props: user_properties(user),
            attributes: attribute_params(&user.attributes),
            payment_methods: payment_method_params(&user.payment_methods),
        });
        self.write(&user.id, statement).await?;
        debug!(user_id = %user.id, attributes = user.attributes.len(), "upserted user");
        Ok(())
    }

    async fn upsert_transaction(&self, tx: &Transaction, attributes: &[Attribute]) -> EngineResult<()> {
        if tx.id.is_empty() {
            return Err(EngineError::validation("transaction id is required"));
        }
        if tx.sender_user_id.is_empty() || tx.receiver_user_id.is_empty() {
            return Err(EngineError::validation(
                "both sender and receiver user ids are required",
            ));
        }

        let statement = Statement::UpsertTransaction(TransactionWrite {
            transaction_id: tx.id.clone(),
            sender_id: tx.sender_user_id.clone(),
            receiver_id: tx.receiver_user_id.clone(),
            amount: tx.amount,
            currency: tx.currency.clone(),
            timestamp: format_time(Some(&tx.timestamp)),
            props: transaction_properties(tx)?,
            attributes: attribute_params(attributes),
            payment_method_id: tx.payment_method_id.clone(),
            linked_at: format_time(Some(&(self.clock)())),
        });
        let result = self.write(&tx.id, statement).await?;
        if result.is_empty() {
            return Err(EngineError::store(
                &tx.id,
                ClientError::MissingParticipant {
                    sender: tx.sender_user_id.clone(),
                    receiver: tx.receiver_user_id.clone(),
                },
            ));
        }
        debug!(transaction_id = %tx.id, attributes = attributes.len(), "upserted transaction");
        Ok(())
    }

    async fn fetch_user_relationships(&self, user_id: &str) -> EngineResult<UserRelationships> {
        if user_id.is_empty() {
            return Err(EngineError::validation("user id is required"));
        }
        let user_id = user_id.to_string();

        let direct = self
            .read(&user_id, Statement::UserDirectLinks { user_id: user_id.clone() })
            .await?;
        let transactions = self
            .read(&user_id, Statement::UserTransactions { user_id: user_id.clone() })
            .await?;
        let shared = self
            .read(&user_id, Statement::UserSharedAttributes { user_id: user_id.clone() })
            .await?;

        Ok(UserRelationships {
            direct_links: direct
                .records
                .iter()
                .map(|r| DirectUserLink {
                    user_id: r.string("peerId"),
                    link_type: r.string("linkType"),
                    direction: r.string("direction"),
                    transaction_id: r.string("transactionId"),
                    amount: r.float("amount"),
                    currency: r.string("currency"),
                    timestamp: r.time("timestamp"),
                })
                .collect(),
            transactions: transactions
                .records
                .iter()
                .map(|r| UserTransactionLink {
                    transaction_id: r.string("transactionId"),
                    role: r.string("role"),
                    amount: r.float("amount"),
                    currency: r.string("currency"),
                    timestamp: r.time("timestamp"),
                })
                .collect(),
            shared_attributes: shared
                .records
                .iter()
                .map(|r| SharedAttributeLink {
                    attribute_type: r.string("attributeType"),
                    attribute_hash: r.string("attributeHash"),
                    user_ids: r.string_list("userIds"),
                })
                .collect(),
            user_id,
        })
    }

    async fn fetch_transaction_relationships(&self, transaction_id: &str) -> EngineResult<TransactionRelationships> {
        if transaction_id.is_empty() {
            return Err(EngineError::validation("transaction id is required"));
        }
        let transaction_id = transaction_id.to_string();

        let users = self
            .read(
                &transaction_id,
                Statement::TransactionUsers { transaction_id: transaction_id.clone() },
            )
            .await?;
        let linked = self
            .read(
                &transaction_id,
                Statement::LinkedTransactions { transaction_id: transaction_id.clone() },
            )
            .await?;

        Ok(TransactionRelationships {
            users: users
                .records
                .iter()
                .map(|r| TransactionUserLink {
                    user_id: r.string("userId"),
                    role: r.string("role"),
                    amount: r.float("amount"),
                    currency: r.string("currency"),
                    direction: r.string("direction"),
                })
                .collect(),
            linked_transactions: linked
                .records
                .iter()
                .map(|r| LinkedTransaction {
                    transaction_id: r.string("otherTransactionId"),
                    link_type: r.string("linkType"),
                    attribute_hash: r.string("attributeHash"),
                    score: r.float("score"),
                    last_updated: r.time("updatedAt"),
                })
                .collect(),
            transaction_id,
        })
    }

    async fn shortest_path_between_users(&self, source_id: &str, target_id: &str) -> EngineResult<ShortestPath> {
        if source_id.is_empty() || target_id.is_empty() {
            return Err(EngineError::validation(
                "source and target user ids are required",
            ));
        }
        if source_id == target_id {
            return Ok(ShortestPath::trivial(source_id));
        }

        let key = format!("{}->{}", source_id, target_id);
        let result = self
            .read(
                &key,
                Statement::ShortestPath {
                    source_id: source_id.to_string(),
                    target_id: target_id.to_string(),
                    max_hops: MAX_PATH_HOPS,
                },
            )
            .await?;
        Ok(decode_path(source_id, target_id, &result))
    }

    async fn export_users(&self) -> EngineResult<Vec<UserSummary>> {
        let result = self.read("users", Statement::ExportUsers).await?;
        Ok(result.records.iter().map(user_summary).collect())
    }

    async fn export_transactions(&self) -> EngineResult<Vec<TransactionSummary>> {
        let result = self.read("transactions", Statement::ExportTransactions).await?;
        Ok(result.records.iter().map(transaction_summary).collect())
    }

    async fn list_users(&self, query: &UserQuery) -> EngineResult<UserListResult> {
        let page = self.read("users", Statement::ListUsers(query.clone())).await?;
        let total = self
            .read("users", Statement::CountUsers(query.filter.clone()))
            .await?;
        Ok(UserListResult {
            items: page.records.iter().map(user_summary).collect(),
            total: count(&total),
        })
    }

    async fn list_transactions(&self, query: &TransactionQuery) -> EngineResult<TransactionListResult> {
        let page = self
            .read("transactions", Statement::ListTransactions(query.clone()))
            .await?;
        let total = self
            .read("transactions", Statement::CountTransactions(query.filter.clone()))
            .await?;
        Ok(TransactionListResult {
            items: page.records.iter().map(transaction_summary).collect(),
            total: count(&total),
        })
    }
}
