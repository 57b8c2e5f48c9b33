//! List filters
//!
//! A filter holds already-normalized values. Each present value contributes
//! one fixed predicate to the WHERE clause and one parameter; the same
//! filter can also be evaluated directly against store nodes.

use crate::graph::Node;
use crate::model::{parse_time, TransactionListParams, UserListParams};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn render_where(predicates: &[&str]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", predicates.join("\n  AND "))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    /// Uppercase
    pub kyc_status: Option<String>,
    pub risk_min: Option<f64>,
    pub risk_max: Option<f64>,
    /// Lowercase, matched against name, email and id
    pub search: Option<String>,
    /// Lowercase
    pub country: Option<String>,
    /// Lowercase
    pub city: Option<String>,
    /// Lowercase with a leading `@`
    pub email_domain: Option<String>,
}

impl From<&UserListParams> for UserFilter {
    fn from(params: &UserListParams) -> Self {
        let risk_min = params.risk_min.map(|v| v.clamp(0.0, 1.0)).filter(|v| *v > 0.0);
        let risk_max = params
            .risk_max
            .map(|v| v.clamp(0.0, 1.0))
            .filter(|v| *v > 0.0)
            .map(|v| v.max(risk_min.unwrap_or(0.0)));

        let email_domain = non_empty(
            params
                .email_domain
                .trim()
                .trim_start_matches('@')
                .to_lowercase(),
        )
        .map(|d| format!("@{}", d));

        UserFilter {
            kyc_status: non_empty(params.kyc_status.trim().to_uppercase()),
            risk_min,
            risk_max,
            search: non_empty(params.search.trim().to_lowercase()),
            country: non_empty(params.country.trim().to_lowercase()),
            city: non_empty(params.city.trim().to_lowercase()),
            email_domain,
        }
    }
}

impl UserFilter {
    pub fn where_clause(&self) -> String {
        let mut predicates = Vec::new();
        if self.kyc_status.is_some() {
            predicates.push("toUpper(u.kycStatus) = $kycStatus");
        }
        if self.risk_min.is_some() {
            predicates.push("coalesce(u.riskScore, 0.0) >= $riskMin");
        }
        if self.risk_max.is_some() {
            predicates.push("coalesce(u.riskScore, 0.0) <= $riskMax");
        }
        if self.search.is_some() {
            predicates.push(
                "(toLower(u.fullName) CONTAINS $search OR toLower(u.email) CONTAINS $search OR toLower(u.userId) CONTAINS $search)",
            );
        }
        if self.country.is_some() {
            predicates.push("toLower(coalesce(u.addressCountry, \"\")) = $country");
        }
        if self.city.is_some() {
            predicates.push("toLower(coalesce(u.addressCity, \"\")) = $city");
        }
        if self.email_domain.is_some() {
            predicates.push("toLower(u.email) ENDS WITH $emailDomain");
        }
        render_where(&predicates)
    }

    pub fn write_params(&self, params: &mut Map<String, Value>) {
        let strings = [
            ("kycStatus", &self.kyc_status),
            ("search", &self.search),
            ("country", &self.country),
            ("city", &self.city),
            ("emailDomain", &self.email_domain),
        ];
        for (name, value) in strings {
            if let Some(v) = value {
                params.insert(name.to_string(), Value::from(v.as_str()));
            }
        }
        if let Some(v) = self.risk_min {
            params.insert("riskMin".to_string(), Value::from(v));
        }
        if let Some(v) = self.risk_max {
            params.insert("riskMax".to_string(), Value::from(v));
        }
    }

    pub fn matches(&self, user: &Node) -> bool {
        if let Some(kyc) = &self.kyc_status {
            if user.str_property("kycStatus").to_uppercase() != *kyc {
                return false;
            }
        }
        let risk = user.float_property("riskScore");
        if self.risk_min.map_or(false, |min| risk < min) {
            return false;
        }
        if self.risk_max.map_or(false, |max| risk > max) {
            return false;
        }
        if let Some(search) = &self.search {
            let hit = ["fullName", "email", "userId"]
                .iter()
                .any(|key| user.str_property(key).to_lowercase().contains(search.as_str()));
            if !hit {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if user.str_property("addressCountry").to_lowercase() != *country {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if user.str_property("addressCity").to_lowercase() != *city {
                return false;
            }
        }
        if let Some(domain) = &self.email_domain {
            if !user.str_property("email").to_lowercase().ends_with(domain.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    /// Uppercase
    pub status: Option<String>,
    /// Uppercase
    pub tx_type: Option<String>,
    /// Uppercase
    pub channel: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Lowercase, matched against the transaction id and participant id, name and email
    pub search: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl From<&TransactionListParams> for TransactionFilter {
    fn from(params: &TransactionListParams) -> Self {
        let min_amount = params.min_amount.filter(|v| *v > 0.0);
        let max_amount = params
            .max_amount
            .filter(|v| *v > 0.0)
            .map(|v| v.max(min_amount.unwrap_or(0.0)));

        TransactionFilter {
            user_id: non_empty(params.user_id.trim().to_string()),
            status: non_empty(params.status.trim().to_uppercase()),
            tx_type: non_empty(params.tx_type.trim().to_uppercase()),
            channel: non_empty(params.channel.trim().to_uppercase()),
            min_amount,
            max_amount,
            search: non_empty(params.search.trim().to_lowercase()),
            start: params.start_time,
            end: params.end_time,
        }
    }
}

impl TransactionFilter {
    pub fn where_clause(&self) -> String {
        let mut predicates = Vec::new();
        if self.status.is_some() {
            predicates.push("toUpper(t.status) = $status");
        }
        if self.tx_type.is_some() {
            predicates.push("toUpper(t.type) = $type");
        }
        if self.search.is_some() {
            predicates.push(
                "(toLower(t.transactionId) CONTAINS $search OR EXISTS { \
                 MATCH (participant:User)-[:PARTICIPATED_IN]->(t) \
                 WHERE toLower(participant.userId) CONTAINS $search \
                 OR toLower(coalesce(participant.fullName, \"\")) CONTAINS $search \
                 OR toLower(coalesce(participant.email, \"\")) CONTAINS $search })",
            );
        }
        if self.min_amount.is_some() {
            predicates.push("coalesce(t.amount, 0.0) >= $minAmount");
        }
        if self.max_amount.is_some() {
            predicates.push("coalesce(t.amount, 0.0) <= $maxAmount");
        }
        if self.user_id.is_some() {
            predicates.push("EXISTS { MATCH (:User {userId: $userId})-[:PARTICIPATED_IN]->(t) }");
        }
        if self.start.is_some() {
            predicates.push("datetime(t.timestamp) >= datetime($startTs)");
        }
        if self.end.is_some() {
            predicates.push("datetime(t.timestamp) <= datetime($endTs)");
        }
        if self.channel.is_some() {
            predicates.push("toUpper(t.channel) = $channel");
        }
        render_where(&predicates)
    }

    pub fn write_params(&self, params: &mut Map<String, Value>) {
        let strings = [
            ("userId", &self.user_id),
            ("status", &self.status),
            ("type", &self.tx_type),
            ("channel", &self.channel),
            ("search", &self.search),
        ];
        for (name, value) in strings {
            if let Some(v) = value {
                params.insert(name.to_string(), Value::from(v.as_str()));
            }
        }
        if let Some(v) = self.min_amount {
            params.insert("minAmount".to_string(), Value::from(v));
        }
        if let Some(v) = self.max_amount {
            params.insert("maxAmount".to_string(), Value::from(v));
        }
        if let Some(t) = &self.start {
            params.insert("startTs".to_string(), Value::from(crate::model::format_time(Some(t))));
        }
        if let Some(t) = &self.end {
            params.insert("endTs".to_string(), Value::from(crate::model::format_time(Some(t))));
        }
    }

    /// `participants` are the users with a participation edge into `tx`
    pub fn matches(&self, tx: &Node, participants: &[&Node]) -> bool {
        let upper_eq = |key: &str, want: &Option<String>| {
            want.as_ref()
                .map_or(true, |w| tx.str_property(key).to_uppercase() == *w)
        };
        if !upper_eq("status", &self.status)
            || !upper_eq("type", &self.tx_type)
            || !upper_eq("channel", &self.channel)
        {
            return false;
        }

        let amount = tx.float_property("amount");
        if self.min_amount.map_or(false, |min| amount < min) {
            return false;
        }
        if self.max_amount.map_or(false, |max| amount > max) {
            return false;
        }

        if let Some(user_id) = &self.user_id {
            if !participants.iter().any(|p| p.str_property("userId") == user_id) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let in_id = tx.str_property("transactionId").to_lowercase().contains(search.as_str());
            let in_participant = participants.iter().any(|p| {
                ["userId", "fullName", "email"]
                    .iter()
                    .any(|key| p.str_property(key).to_lowercase().contains(search.as_str()))
            });
            if !in_id && !in_participant {
                return false;
            }
        }

        if self.start.is_some() || self.end.is_some() {
            let ts = match parse_time(tx.str_property("timestamp")) {
                Some(ts) => ts,
                None => return false,
            };
            if self.start.map_or(false, |start| ts < start) {
                return false;
            }
            if self.end.map_or(false, |end| ts > end) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, NodeLabel};

    fn user(id: &str, name: &str, email: &str, kyc: &str, risk: f64, city: &str) -> Node {
        let mut node = Node::new(NodeId::new(1), NodeLabel::User);
        node.set_property("userId", id);
        node.set_property("fullName", name);
        node.set_property("email", email);
        node.set_property("kycStatus", kyc);
        node.set_property("riskScore", risk);
        node.set_property("addressCity", city);
        node.set_property("addressCountry", "US");
        node
    }

    #[test]
    fn test_user_filter_normalization() {
        let params = UserListParams {
            kyc_status: " verified ".to_string(),
            search: "  JANE ".to_string(),
            email_domain: "@Example.COM".to_string(),
            risk_min: Some(0.6),
            risk_max: Some(0.2),
            ..Default::default()
        };
        let filter = UserFilter::from(&params);
        assert_eq!(filter.kyc_status.as_deref(), Some("VERIFIED"));
        assert_eq!(filter.search.as_deref(), Some("jane"));
        assert_eq!(filter.email_domain.as_deref(), Some("@example.com"));
        assert_eq!(filter.risk_min, Some(0.6));
        // max below min is raised to min
        assert_eq!(filter.risk_max, Some(0.6));
        assert_eq!(filter.country, None);
    }

    #[test]
    fn test_user_where_clause_uses_parameters_only() {
        let params = UserListParams {
            search: "x' OR 1=1 //".to_string(),
            city: "Austin".to_string(),
            ..Default::default()
        };
        let filter = UserFilter::from(&params);
        let clause = filter.where_clause();
        assert!(clause.starts_with("WHERE "));
        assert!(clause.contains("$search"));
        assert!(clause.contains("$city"));
        assert!(!clause.contains("1=1"));
        assert!(!clause.contains("$kycStatus"));

        let mut map = Map::new();
        filter.write_params(&mut map);
        assert_eq!(map["search"], "x' or 1=1 //");
        assert_eq!(map["city"], "austin");
        assert!(!map.contains_key("kycStatus"));

        assert_eq!(UserFilter::default().where_clause(), "");
    }

    #[test]
    fn test_user_filter_matches() {
        let jane = user("USR-1", "Jane Doe", "jane@example.com", "VERIFIED", 0.3, "Austin");
        let filter = UserFilter::from(&UserListParams {
            kyc_status: "verified".to_string(),
            city: "austin".to_string(),
            email_domain: "example.com".to_string(),
            risk_max: Some(0.5),
            ..Default::default()
        });
        assert!(filter.matches(&jane));

        let risky = UserFilter::from(&UserListParams {
            risk_min: Some(0.5),
            ..Default::default()
        });
        assert!(!risky.matches(&jane));

        let search = UserFilter::from(&UserListParams {
            search: "usr-1".to_string(),
            ..Default::default()
        });
        assert!(search.matches(&jane));
    }

    #[test]
    fn test_transaction_filter_matches() {
        let mut tx = Node::new(NodeId::new(2), NodeLabel::Transaction);
        tx.set_property("transactionId", "TX-1");
        tx.set_property("status", "COMPLETED");
        tx.set_property("channel", "WEB");
        tx.set_property("amount", 250.0);
        tx.set_property("timestamp", "2024-04-20T12:00:00Z");
        let sender = user("USR-1", "Jane Doe", "jane@example.com", "VERIFIED", 0.3, "Austin");

        let filter = TransactionFilter::from(&TransactionListParams {
            status: "completed".to_string(),
            min_amount: Some(100.0),
            max_amount: Some(50.0),
            search: "jane".to_string(),
            user_id: "USR-1".to_string(),
            ..Default::default()
        });
        // max below min is raised to min, so 250 is out of range
        assert_eq!(filter.max_amount, Some(100.0));
        assert!(!filter.matches(&tx, &[&sender]));

        let filter = TransactionFilter::from(&TransactionListParams {
            status: "completed".to_string(),
            channel: "web".to_string(),
            search: "jane".to_string(),
            start_time: parse_time("2024-04-20T00:00:00Z"),
            end_time: parse_time("2024-04-21T00:00:00Z"),
            ..Default::default()
        });
        assert!(filter.matches(&tx, &[&sender]));
        assert!(!filter.matches(&tx, &[]));

        let clause = filter.where_clause();
        assert!(clause.contains("datetime($startTs)"));
        assert!(clause.contains("$channel"));
        assert!(!clause.contains("$userId"));
    }
}
