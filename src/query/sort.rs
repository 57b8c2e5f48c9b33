//! ORDER BY rendering and the equivalent in-process comparators
//!
//! Missing values sort last in ascending order and first in descending order,
//! which is how Cypher orders nulls.

use crate::graph::Node;
use crate::model::{parse_time, SortOrder, TransactionSortField, UserSortField};
use std::cmp::Ordering;

pub fn user_order_clause(field: UserSortField, order: SortOrder) -> String {
    let expr = match field {
        UserSortField::UserId => "u.userId",
        UserSortField::FullName => "toLower(u.fullName)",
        UserSortField::RiskScore => "coalesce(u.riskScore, 0.0)",
        UserSortField::CreatedAt => "datetime(u.createdAt)",
        UserSortField::UpdatedAt => "datetime(u.updatedAt)",
    };
    format!("{} {}", expr, order.as_str())
}

pub fn transaction_order_clause(field: TransactionSortField, order: SortOrder) -> String {
    let expr = match field {
        TransactionSortField::Timestamp => "datetime(t.timestamp)",
        TransactionSortField::Amount => "coalesce(t.amount, 0.0)",
        TransactionSortField::Status => "toUpper(t.status)",
        TransactionSortField::Type => "toUpper(t.type)",
        TransactionSortField::Channel => "toUpper(t.channel)",
        TransactionSortField::CreatedAt => "datetime(t.createdAt)",
        TransactionSortField::UpdatedAt => "datetime(t.updatedAt)",
        TransactionSortField::TransactionId => "t.transactionId",
    };
    format!("{} {}", expr, order.as_str())
}

fn time_cmp(a: &Node, b: &Node, key: &str) -> Ordering {
    match (parse_time(a.str_property(key)), parse_time(b.str_property(key))) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn float_cmp(a: &Node, b: &Node, key: &str) -> Ordering {
    a.float_property(key)
        .partial_cmp(&b.float_property(key))
        .unwrap_or(Ordering::Equal)
}

fn apply(order: SortOrder, ordering: Ordering) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

pub fn compare_users(a: &Node, b: &Node, field: UserSortField, order: SortOrder) -> Ordering {
    let primary = match field {
        UserSortField::UserId => a.str_property("userId").cmp(b.str_property("userId")),
        UserSortField::FullName => a
            .str_property("fullName")
            .to_lowercase()
            .cmp(&b.str_property("fullName").to_lowercase()),
        UserSortField::RiskScore => float_cmp(a, b, "riskScore"),
        UserSortField::CreatedAt => time_cmp(a, b, "createdAt"),
        UserSortField::UpdatedAt => time_cmp(a, b, "updatedAt"),
    };
    apply(order, primary).then_with(|| a.str_property("userId").cmp(b.str_property("userId")))
}

pub fn compare_transactions(a: &Node, b: &Node, field: TransactionSortField, order: SortOrder) -> Ordering {
    let upper = |key: &str| {
        a.str_property(key)
            .to_uppercase()
            .cmp(&b.str_property(key).to_uppercase())
    };
    let primary = match field {
        TransactionSortField::Timestamp => time_cmp(a, b, "timestamp"),
        TransactionSortField::Amount => float_cmp(a, b, "amount"),
        TransactionSortField::Status => upper("status"),
        TransactionSortField::Type => upper("type"),
        TransactionSortField::Channel => upper("channel"),
        TransactionSortField::CreatedAt => time_cmp(a, b, "createdAt"),
        TransactionSortField::UpdatedAt => time_cmp(a, b, "updatedAt"),
        TransactionSortField::TransactionId => a
            .str_property("transactionId")
            .cmp(b.str_property("transactionId")),
    };
    apply(order, primary).then_with(|| {
        a.str_property("transactionId")
            .cmp(b.str_property("transactionId"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, NodeLabel};

    fn tx(id: &str, amount: f64, timestamp: &str) -> Node {
        let mut node = Node::new(NodeId::new(1), NodeLabel::Transaction);
        node.set_property("transactionId", id);
        node.set_property("amount", amount);
        node.set_property("timestamp", timestamp);
        node
    }

    #[test]
    fn test_order_clauses() {
        assert_eq!(user_order_clause(UserSortField::default(), SortOrder::Asc), "u.userId ASC");
        assert_eq!(
            transaction_order_clause(TransactionSortField::default(), SortOrder::Desc),
            "datetime(t.timestamp) DESC"
        );
        assert_eq!(
            transaction_order_clause(TransactionSortField::Amount, SortOrder::Asc),
            "coalesce(t.amount, 0.0) ASC"
        );
    }

    #[test]
    fn test_compare_transactions() {
        let early = tx("TX-2", 10.0, "2024-01-01T00:00:00Z");
        let late = tx("TX-1", 5.0, "2024-02-01T00:00:00.5Z");
        let undated = tx("TX-3", 7.0, "");

        let mut items = vec![&early, &undated, &late];
        items.sort_by(|a, b| compare_transactions(a, b, TransactionSortField::Timestamp, SortOrder::Desc));
        let ids: Vec<_> = items.iter().map(|n| n.str_property("transactionId")).collect();
        assert_eq!(ids, vec!["TX-3", "TX-1", "TX-2"]);

        items.sort_by(|a, b| compare_transactions(a, b, TransactionSortField::Amount, SortOrder::Asc));
        let ids: Vec<_> = items.iter().map(|n| n.str_property("transactionId")).collect();
        assert_eq!(ids, vec!["TX-1", "TX-3", "TX-2"]);
    }
}
