//! Relationship service
//!
//! Entry point for callers: turns ingestion payloads into normalized domain
//! entities plus attribute fingerprints, hands them to the repository, and
//! serves the relationship, path and list views.

use chrono::Utc;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::model::{
    normalize_pagination, Address, Page, PaginationMeta, PaymentMethod, ShortestPath, SortOrder,
    Transaction, TransactionInput, TransactionListParams, TransactionRelationships, TransactionSummary,
    User, UserInput, UserListParams, UserRelationships, UserSummary,
};
use crate::normalize::{
    convert_custom_attributes, normalize_email, normalize_phone, sanitize, AttributeGenerator,
    DefaultAttributeGenerator,
};
use crate::query::{TransactionFilter, TransactionQuery, UserFilter, UserQuery};
use crate::repository::{Clock, GraphRepository};

pub struct RelationshipService {
    repo: Arc<dyn GraphRepository>,
    attributes: Arc<dyn AttributeGenerator>,
    clock: Clock,
}

impl RelationshipService {
    pub fn new(repo: Arc<dyn GraphRepository>) -> Self {
        Self {
            repo,
            attributes: Arc::new(DefaultAttributeGenerator),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the attribute derivation rules
    pub fn with_generator(mut self, generator: Arc<dyn AttributeGenerator>) -> Self {
        self.attributes = generator;
        self
    }

    /// Replace the time source used for missing created/updated stamps
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Normalize a user payload, derive its attributes and persist it
    pub async fn upsert_user(&self, input: &UserInput) -> EngineResult<()> {
        if input.id.is_empty() {
            return Err(EngineError::validation("user id is required"));
        }

        let now = (self.clock)();
        let mut attributes = self.attributes.attributes_for_user(input);
        attributes.extend(convert_custom_attributes(&input.attributes));

        let user = User {
            id: input.id.clone(),
            full_name: sanitize(&input.full_name),
            email: normalize_email(&input.email),
            phone: normalize_phone(&input.phone),
            address: Address::from(&input.address),
            date_of_birth: input.date_of_birth,
            kyc_status: input.kyc_status.clone(),
            risk_score: input.risk_score,
            attributes,
            payment_methods: input.payment_methods.iter().map(PaymentMethod::from).collect(),
            created_at: Some(input.created_at.unwrap_or(now)),
            updated_at: input.updated_at.unwrap_or(now),
        };

        self.repo.upsert_user(&user).await
    }

    /// Derive transaction attributes and persist the transaction with its links
    pub async fn upsert_transaction(&self, input: &TransactionInput) -> EngineResult<()> {
        if input.id.is_empty() {
            return Err(EngineError::validation("transaction id is required"));
        }
        if input.sender_user_id.is_empty() || input.receiver_user_id.is_empty() {
            return Err(EngineError::validation(
                "sender and receiver user ids are required",
            ));
        }

        let now = (self.clock)();
        let tx = Transaction {
            id: input.id.clone(),
            sender_user_id: input.sender_user_id.clone(),
            receiver_user_id: input.receiver_user_id.clone(),
            amount: input.amount,
            currency: input.currency.clone(),
            tx_type: input.tx_type.clone(),
            status: input.status.clone(),
            channel: input.channel.clone(),
            ip_address: input.ip_address.clone(),
            device_id: input.device_id.clone(),
            payment_method_id: input.payment_method_id.clone(),
            timestamp: input.timestamp,
            metadata: input.metadata.clone(),
            created_at: Some(input.created_at.unwrap_or(now)),
            updated_at: input.updated_at.unwrap_or(now),
        };
        let attributes = self.attributes.attributes_for_transaction(input);

        self.repo.upsert_transaction(&tx, &attributes).await
    }

    pub async fn user_relationships(&self, user_id: &str) -> EngineResult<UserRelationships> {
        self.repo.fetch_user_relationships(user_id).await
    }

    pub async fn transaction_relationships(&self, transaction_id: &str) -> EngineResult<TransactionRelationships> {
        self.repo.fetch_transaction_relationships(transaction_id).await
    }

    /// Shortest path between two users, bounded in hops. Ids are sanitized first.
    pub async fn shortest_path(&self, source_id: &str, target_id: &str) -> EngineResult<ShortestPath> {
        let source_id = sanitize(source_id);
        let target_id = sanitize(target_id);
        if source_id.is_empty() || target_id.is_empty() {
            return Err(EngineError::validation(
                "source and target user ids are required",
            ));
        }
        self.repo.shortest_path_between_users(&source_id, &target_id).await
    }

    pub async fn list_users(&self, params: &UserListParams) -> EngineResult<Page<UserSummary>> {
        let (page, page_size) = normalize_pagination(params.page, params.page_size);
        let skip = (page - 1).saturating_mul(page_size);
        let query = UserQuery {
            filter: UserFilter::from(params),
            sort: params.sort_field,
            order: params.sort_order.unwrap_or(SortOrder::Asc),
            skip,
            limit: page_size,
        };
        let result = self.repo.list_users(&query).await?;
        Ok(Page {
            items: result.items,
            pagination: PaginationMeta::new(page, page_size, result.total),
        })
    }

    pub async fn list_transactions(&self, params: &TransactionListParams) -> EngineResult<Page<TransactionSummary>> {
        let (page, page_size) = normalize_pagination(params.page, params.page_size);
        let skip = (page - 1).saturating_mul(page_size);
        let query = TransactionQuery {
            filter: TransactionFilter::from(params),
            sort: params.sort_field,
            order: params.sort_order.unwrap_or(SortOrder::Desc),
            skip,
            limit: page_size,
        };
        let result = self.repo.list_transactions(&query).await?;
        Ok(Page {
            items: result.items,
            pagination: PaginationMeta::new(page, page_size, result.total),
        })
    }

    pub async fn export_users(&self) -> EngineResult<Vec<UserSummary>> {
        self.repo.export_users().await
    }

    pub async fn export_transactions(&self) -> EngineResult<Vec<TransactionSummary>> {
        self.repo.export_transactions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{EmbeddedClient, GraphClient};
    use crate::model::{AttributeInput, UserSortField};
    use crate::repository::Repository;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use std::sync::Mutex;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap()
    }

    /// Records what reaches the repository
    #[derive(Default)]
    struct RecordingRepo {
        users: Mutex<Vec<User>>,
        paths: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl GraphRepository for RecordingRepo {
        async fn upsert_user(&self, user: &User) -> EngineResult<()> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }
        async fn upsert_transaction(&self, _tx: &Transaction, _attributes: &[crate::model::Attribute]) -> EngineResult<()> {
            Ok(())
        }
        async fn fetch_user_relationships(&self, _user_id: &str) -> EngineResult<UserRelationships> {
            Ok(UserRelationships::default())
        }
        async fn fetch_transaction_relationships(&self, _id: &str) -> EngineResult<TransactionRelationships> {
            Ok(TransactionRelationships::default())
        }
        async fn shortest_path_between_users(&self, source_id: &str, target_id: &str) -> EngineResult<ShortestPath> {
            self.paths
                .lock()
                .unwrap()
                .push((source_id.to_string(), target_id.to_string()));
            Ok(ShortestPath::default())
        }
        async fn export_users(&self) -> EngineResult<Vec<UserSummary>> {
            Ok(Vec::new())
        }
        async fn export_transactions(&self) -> EngineResult<Vec<TransactionSummary>> {
            Ok(Vec::new())
        }
        async fn list_users(&self, _query: &UserQuery) -> EngineResult<crate::model::UserListResult> {
            Ok(Default::default())
        }
        async fn list_transactions(&self, _query: &TransactionQuery) -> EngineResult<crate::model::TransactionListResult> {
            Ok(Default::default())
        }
    }

    #[tokio::test]
    async fn test_upsert_user_normalizes_fields() {
        let repo = Arc::new(RecordingRepo::default());
        let service = RelationshipService::new(repo.clone()).with_clock(Arc::new(fixed));

        let input = UserInput {
            id: "USR-1".to_string(),
            full_name: "  Jane   Doe ".to_string(),
            email: " Jane@Example.COM".to_string(),
            phone: "(555) 010-9999".to_string(),
            attributes: vec![
                AttributeInput {
                    attribute_type: "LOYALTY".to_string(),
                    value: "gold".to_string(),
                    ..Default::default()
                },
                AttributeInput {
                    attribute_type: "LOYALTY".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        service.upsert_user(&input).await.unwrap();

        let users = repo.users.lock().unwrap();
        let user = &users[0];
        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.phone, "+5550109999");
        assert_eq!(user.created_at, Some(fixed()));
        assert_eq!(user.updated_at, fixed());
        // email, phone, custom; the empty address yields nothing
        assert_eq!(user.attributes.len(), 3);
        let custom = user.attributes.last().unwrap();
        assert_eq!(custom.attribute_type, "LOYALTY");
        assert_eq!(custom.confidence_score, 1.0);
    }

    #[tokio::test]
    async fn test_missing_ids_rejected_before_repository() {
        let repo = Arc::new(RecordingRepo::default());
        let service = RelationshipService::new(repo.clone());

        let err = service.upsert_user(&UserInput::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let tx = TransactionInput {
            id: "TX-1".to_string(),
            sender_user_id: "USR-1".to_string(),
            ..Default::default()
        };
        let err = service.upsert_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(repo.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shortest_path_sanitizes_ids() {
        let repo = Arc::new(RecordingRepo::default());
        let service = RelationshipService::new(repo.clone());

        service.shortest_path("  USR-1 ", "USR-2\n").await.unwrap();
        assert_eq!(
            repo.paths.lock().unwrap()[0],
            ("USR-1".to_string(), "USR-2".to_string())
        );

        let err = service.shortest_path("   ", "USR-2").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_trivial_path_reaches_no_store() {
        let client = Arc::new(EmbeddedClient::new());
        client.close().await.unwrap();
        let service = RelationshipService::new(Arc::new(Repository::new(client)));

        let path = service.shortest_path("USR-1", "USR-1").await.unwrap();
        assert_eq!(path.hops, Some(0));
        assert_eq!(path.nodes.len(), 1);
        assert_eq!(path.nodes[0].node_type, "User");
        assert!(path.edges.is_empty());
    }

    #[tokio::test]
    async fn test_list_users_pages() {
        let client = Arc::new(EmbeddedClient::new());
        let service = RelationshipService::new(Arc::new(Repository::new(client)));
        for i in 1..=5 {
            let input = UserInput {
                id: format!("USR-{}", i),
                risk_score: i as f64 / 10.0,
                ..Default::default()
            };
            service.upsert_user(&input).await.unwrap();
        }

        let page = service
            .list_users(&UserListParams {
                page: Some(2),
                page_size: Some(2),
                sort_field: UserSortField::RiskScore,
                sort_order: Some(SortOrder::Desc),
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["USR-3", "USR-2"]);
        assert_eq!(page.pagination.total_items, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }
}
