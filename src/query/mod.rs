//! Typed graph statements
//!
//! Every read and write the engine issues is a [`Statement`] variant. A
//! statement renders to Cypher text plus a parameter map for remote stores,
//! and is interpreted directly by the embedded store. Caller-provided values
//! only ever travel as parameters.

pub mod cypher;
pub mod filter;
pub mod sort;

pub use filter::{TransactionFilter, UserFilter};

use crate::graph::PropertyMap;
use crate::model::{SortOrder, TransactionSortField, UserSortField};
use serde::Serialize;
use serde_json::{Map, Value};

/// Hop bound of the user-to-user path search
pub const MAX_PATH_HOPS: u32 = 6;

/// Attribute fingerprint as passed to a write statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeParam {
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
    pub raw_value: String,
    /// Stored on HAS_ATTRIBUTE edges
    pub confidence: f64,
    /// Stored on LINKED_TO edges
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodParam {
    pub id: String,
    /// methodType, provider, masked, fingerprint
    pub props: PropertyMap,
    pub first_used_at: String,
    pub last_used_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserWrite {
    pub user_id: String,
    pub props: PropertyMap,
    pub attributes: Vec<AttributeParam>,
    pub payment_methods: Vec<PaymentMethodParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWrite {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub currency: String,
    pub timestamp: String,
    pub props: PropertyMap,
    pub attributes: Vec<AttributeParam>,
    /// Empty when the transaction names no payment method
    pub payment_method_id: String,
    /// Stamped on LINKED_TO edges touched by this write
    pub linked_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub sort: UserSortField,
    pub order: SortOrder,
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub filter: TransactionFilter,
    pub sort: TransactionSortField,
    pub order: SortOrder,
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    UpsertUser(UserWrite),
    UpsertTransaction(TransactionWrite),
    UserDirectLinks { user_id: String },
    UserTransactions { user_id: String },
    UserSharedAttributes { user_id: String },
    TransactionUsers { transaction_id: String },
    LinkedTransactions { transaction_id: String },
    ShortestPath { source_id: String, target_id: String, max_hops: u32 },
    ListUsers(UserQuery),
    CountUsers(UserFilter),
    ListTransactions(TransactionQuery),
    CountTransactions(TransactionFilter),
    ExportUsers,
    ExportTransactions,
    Ping,
}

fn props_json(props: &PropertyMap) -> Value {
    Value::Object(
        props
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Cypher SKIP is a signed 64-bit integer
fn skip_param(skip: usize) -> Value {
    Value::from(i64::try_from(skip).unwrap_or(i64::MAX))
}

fn attributes_json(attrs: &[AttributeParam]) -> Value {
    serde_json::to_value(attrs).unwrap_or(Value::Array(Vec::new()))
}

impl Statement {
    pub fn is_write(&self) -> bool {
        matches!(self, Statement::UpsertUser(_) | Statement::UpsertTransaction(_))
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Statement::UpsertUser(_) => "upsert_user",
            Statement::UpsertTransaction(_) => "upsert_transaction",
            Statement::UserDirectLinks { .. } => "user_direct_links",
            Statement::UserTransactions { .. } => "user_transactions",
            Statement::UserSharedAttributes { .. } => "user_shared_attributes",
            Statement::TransactionUsers { .. } => "transaction_users",
            Statement::LinkedTransactions { .. } => "linked_transactions",
            Statement::ShortestPath { .. } => "shortest_path",
            Statement::ListUsers(_) => "list_users",
            Statement::CountUsers(_) => "count_users",
            Statement::ListTransactions(_) => "list_transactions",
            Statement::CountTransactions(_) => "count_transactions",
            Statement::ExportUsers => "export_users",
            Statement::ExportTransactions => "export_transactions",
            Statement::Ping => "ping",
        }
    }

    pub fn cypher(&self) -> String {
        match self {
            Statement::UpsertUser(_) => cypher::UPSERT_USER.to_string(),
            Statement::UpsertTransaction(_) => cypher::UPSERT_TRANSACTION.to_string(),
            Statement::UserDirectLinks { .. } => cypher::USER_DIRECT_LINKS.to_string(),
            Statement::UserTransactions { .. } => cypher::USER_TRANSACTIONS.to_string(),
            Statement::UserSharedAttributes { .. } => cypher::USER_SHARED_ATTRIBUTES.to_string(),
            Statement::TransactionUsers { .. } => cypher::TRANSACTION_USERS.to_string(),
            Statement::LinkedTransactions { .. } => cypher::LINKED_TRANSACTIONS.to_string(),
            Statement::ShortestPath { max_hops, .. } => cypher::shortest_path(*max_hops),
            Statement::ListUsers(q) => cypher::list_users(
                &q.filter.where_clause(),
                &sort::user_order_clause(q.sort, q.order),
            ),
            Statement::CountUsers(f) => cypher::count_users(&f.where_clause()),
            Statement::ListTransactions(q) => cypher::list_transactions(
                &q.filter.where_clause(),
                &sort::transaction_order_clause(q.sort, q.order),
            ),
            Statement::CountTransactions(f) => cypher::count_transactions(&f.where_clause()),
            Statement::ExportUsers => cypher::export_users(),
            Statement::ExportTransactions => cypher::export_transactions(),
            Statement::Ping => cypher::PING.to_string(),
        }
    }

    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        let mut put = |key: &str, value: Value| {
            params.insert(key.to_string(), value);
        };
        match self {
            Statement::UpsertUser(w) => {
                put("userId", Value::from(w.user_id.as_str()));
                put("props", props_json(&w.props));
                put("attributes", attributes_json(&w.attributes));
                let methods = w
                    .payment_methods
                    .iter()
                    .map(|pm| {
                        serde_json::json!({
                            "id": pm.id,
                            "props": props_json(&pm.props),
                            "firstUsedAt": pm.first_used_at,
                            "lastUsedAt": pm.last_used_at,
                        })
                    })
                    .collect();
                put("paymentMethods", Value::Array(methods));
            }
            Statement::UpsertTransaction(w) => {
                put("transactionId", Value::from(w.transaction_id.as_str()));
                put("senderId", Value::from(w.sender_id.as_str()));
                put("receiverId", Value::from(w.receiver_id.as_str()));
                put("amount", Value::from(w.amount));
                put("currency", Value::from(w.currency.as_str()));
                put("timestamp", Value::from(w.timestamp.as_str()));
                put("props", props_json(&w.props));
                put("attributes", attributes_json(&w.attributes));
                put("paymentMethodId", Value::from(w.payment_method_id.as_str()));
                put("linkedAt", Value::from(w.linked_at.as_str()));
            }
            Statement::UserDirectLinks { user_id }
            | Statement::UserTransactions { user_id }
            | Statement::UserSharedAttributes { user_id } => {
                put("userId", Value::from(user_id.as_str()));
            }
            Statement::TransactionUsers { transaction_id }
            | Statement::LinkedTransactions { transaction_id } => {
                put("transactionId", Value::from(transaction_id.as_str()));
            }
            Statement::ShortestPath { source_id, target_id, .. } => {
                put("sourceId", Value::from(source_id.as_str()));
                put("targetId", Value::from(target_id.as_str()));
            }
            Statement::ListUsers(q) => {
                put("skip", skip_param(q.skip));
                put("limit", Value::from(q.limit as u64));
                q.filter.write_params(&mut params);
            }
            Statement::CountUsers(f) => f.write_params(&mut params),
            Statement::ListTransactions(q) => {
                put("skip", skip_param(q.skip));
                put("limit", Value::from(q.limit as u64));
                q.filter.write_params(&mut params);
            }
            Statement::CountTransactions(f) => f.write_params(&mut params),
            Statement::ExportUsers | Statement::ExportTransactions | Statement::Ping => {}
        }
        params
    }
}
