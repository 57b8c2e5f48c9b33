#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use relgraph::model::{AddressInput, TransactionInput, UserInput};
use relgraph::{EmbeddedClient, RelationshipService, Repository};
use std::sync::Arc;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap()
}

/// Service over a fresh in-process store, with a handle on the store for inspection
pub fn embedded_service() -> (Arc<EmbeddedClient>, Arc<RelationshipService>) {
    let client = Arc::new(EmbeddedClient::new());
    let repo = Repository::new(client.clone()).with_clock(Arc::new(base_time));
    let service = RelationshipService::new(Arc::new(repo)).with_clock(Arc::new(base_time));
    (client, Arc::new(service))
}

/// A user whose only attribute is a unique email
pub fn user(id: &str) -> UserInput {
    UserInput {
        id: id.to_string(),
        full_name: format!("Person {}", id),
        email: format!("{}@example.com", id.to_lowercase()),
        kyc_status: "VERIFIED".to_string(),
        risk_score: 0.5,
        ..Default::default()
    }
}

pub fn user_in(id: &str, city: &str, country: &str) -> UserInput {
    UserInput {
        address: AddressInput {
            line1: format!("{} Main St", id.len()),
            city: city.to_string(),
            country: country.to_string(),
            ..Default::default()
        },
        ..user(id)
    }
}

/// A transfer on its own day with its own IP, so it shares no attribute by default
pub fn transfer(id: &str, sender: &str, receiver: &str, day: i64) -> TransactionInput {
    TransactionInput {
        id: id.to_string(),
        sender_user_id: sender.to_string(),
        receiver_user_id: receiver.to_string(),
        amount: 100.0 + day as f64,
        currency: "USD".to_string(),
        tx_type: "TRANSFER".to_string(),
        status: "COMPLETED".to_string(),
        channel: "WEB".to_string(),
        ip_address: format!("10.0.{}.{}", day / 250, day % 250 + 1),
        timestamp: base_time() - Duration::days(day),
        ..Default::default()
    }
}
