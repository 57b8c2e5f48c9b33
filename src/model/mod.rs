//! Domain and transport models
//!
//! - `input`: payloads accepted for ingestion (camelCase JSON, as written by the generator)
//! - `domain`: normalized entities handed to the repository
//! - `relationships`: read-side views of the graph around a user or transaction
//! - `list`: paginated summaries and their query parameters

pub mod domain;
pub mod input;
pub mod list;
pub mod relationships;

pub use domain::{Address, Attribute, AttributeType, PaymentMethod, Transaction, User};
pub use input::{AddressInput, AttributeInput, PaymentMethodInput, TransactionInput, UserInput};
pub use list::{
    normalize_pagination, Page, PaginationMeta, SortOrder, TransactionListParams, TransactionListResult, TransactionSortField,
    TransactionSummary, UserListParams, UserListResult, UserSortField, UserSummary,
};
pub use relationships::{
    DirectUserLink, LinkedTransaction, PathEdge, PathNode, SharedAttributeLink, ShortestPath,
    TransactionRelationships, TransactionUserLink, UserRelationships, UserTransactionLink,
};

use chrono::{DateTime, SecondsFormat, Utc};

/// Persisted timestamp form: RFC 3339 in UTC with sub-second digits as needed.
/// Absent timestamps are persisted as the empty string.
pub fn format_time(t: Option<&DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

/// Lenient inverse of [`format_time`]; anything unparsable is treated as absent.
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_format() {
        let t = Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap();
        assert_eq!(format_time(Some(&t)), "2024-04-20T12:00:00Z");
        assert_eq!(format_time(None), "");

        let with_nanos = t + chrono::Duration::nanoseconds(1_500);
        let formatted = format_time(Some(&with_nanos));
        assert_eq!(parse_time(&formatted), Some(with_nanos));
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("yesterday"), None);
    }
}
