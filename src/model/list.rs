//! Paginated list views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub kyc_status: String,
    pub risk_score: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub channel: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserListResult {
    pub items: Vec<UserSummary>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionListResult {
    pub items: Vec<TransactionSummary>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: usize,
    pub page_size: usize,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: usize, page_size: usize, total_items: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size as u64)
        };
        PaginationMeta {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}

/// One page of results with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Clamp caller pagination: page defaults to 1, page size to 50 (at most 200).
pub fn normalize_pagination(page: Option<usize>, page_size: Option<usize>) -> (usize, usize) {
    let page = match page {
        Some(p) if p > 0 => p,
        _ => 1,
    };
    let page_size = match page_size {
        Some(s) if s > 0 => s.min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    };
    (page, page_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Case-insensitive; anything else is `None`
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if name.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserSortField {
    #[default]
    UserId,
    FullName,
    RiskScore,
    CreatedAt,
    UpdatedAt,
}

impl UserSortField {
    /// Case-insensitive field name; unknown names sort by user id
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "fullname" => UserSortField::FullName,
            "riskscore" => UserSortField::RiskScore,
            "createdat" => UserSortField::CreatedAt,
            "updatedat" => UserSortField::UpdatedAt,
            _ => UserSortField::UserId,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionSortField {
    #[default]
    Timestamp,
    Amount,
    Status,
    Type,
    Channel,
    CreatedAt,
    UpdatedAt,
    TransactionId,
}

impl TransactionSortField {
    /// Case-insensitive field name; unknown names sort by timestamp
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "amount" => TransactionSortField::Amount,
            "status" => TransactionSortField::Status,
            "type" => TransactionSortField::Type,
            "channel" => TransactionSortField::Channel,
            "createdat" => TransactionSortField::CreatedAt,
            "updatedat" => TransactionSortField::UpdatedAt,
            "transactionid" => TransactionSortField::TransactionId,
            _ => TransactionSortField::Timestamp,
        }
    }
}

/// Filters for listing users. Empty strings and `None` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: String,
    pub kyc_status: String,
    pub risk_min: Option<f64>,
    pub risk_max: Option<f64>,
    pub country: String,
    pub city: String,
    pub email_domain: String,
    pub sort_field: UserSortField,
    /// Defaults to ascending
    pub sort_order: Option<SortOrder>,
}

/// Filters for listing transactions. Empty strings and `None` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: String,
    pub user_id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub channel: String,
    pub sort_field: TransactionSortField,
    /// Defaults to descending
    pub sort_order: Option<SortOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pagination() {
        assert_eq!(normalize_pagination(None, None), (1, 50));
        assert_eq!(normalize_pagination(Some(0), Some(0)), (1, 50));
        assert_eq!(normalize_pagination(Some(3), Some(500)), (3, 200));
        assert_eq!(normalize_pagination(Some(2), Some(25)), (2, 25));
    }

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(1, 50, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 50, 1).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 50, 100).total_pages, 2);
        assert_eq!(PaginationMeta::new(1, 50, 101).total_pages, 3);
    }

    #[test]
    fn test_sort_names() {
        assert_eq!(UserSortField::from_name("RiskScore"), UserSortField::RiskScore);
        assert_eq!(UserSortField::from_name("bogus"), UserSortField::UserId);
        assert_eq!(TransactionSortField::from_name("transactionId"), TransactionSortField::TransactionId);
        assert_eq!(TransactionSortField::from_name(""), TransactionSortField::Timestamp);
        assert_eq!(SortOrder::from_name("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::from_name("sideways"), None);
    }
}
