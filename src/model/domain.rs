//! Normalized entities persisted by the repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl From<&super::AddressInput> for Address {
    fn from(input: &super::AddressInput) -> Self {
        Address {
            line1: input.line1.clone(),
            line2: input.line2.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
        }
    }
}

/// Attribute kinds derived by the normalizer. Custom attributes may carry any other type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Email,
    Phone,
    Address,
    IpAddress,
    Device,
    PaymentMethod,
    TxDayBucket,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Email => "EMAIL",
            AttributeType::Phone => "PHONE",
            AttributeType::Address => "ADDRESS",
            AttributeType::IpAddress => "IP",
            AttributeType::Device => "DEVICE",
            AttributeType::PaymentMethod => "PAYMENT_METHOD",
            AttributeType::TxDayBucket => "TX_DAY_BUCKET",
        }
    }

    /// Fixed identity weight for derived attributes of this type
    pub fn confidence(&self) -> f64 {
        match self {
            AttributeType::Email | AttributeType::Phone => 1.0,
            AttributeType::Address | AttributeType::Device => 0.9,
            AttributeType::IpAddress => 0.85,
            // user-side; transaction-side payment references use 0.9
            AttributeType::PaymentMethod => 0.95,
            AttributeType::TxDayBucket => 0.5,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity fingerprint. `value` is the hash and the identity; `raw_value` is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
    pub raw_value: String,
    pub confidence_score: f64,
}

impl Attribute {
    pub fn new(
        attribute_type: impl Into<String>,
        value: impl Into<String>,
        raw_value: impl Into<String>,
        confidence_score: f64,
    ) -> Self {
        Attribute {
            attribute_type: attribute_type.into(),
            value: value.into(),
            raw_value: raw_value.into(),
            confidence_score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub method_type: String,
    pub provider: String,
    pub masked: String,
    pub fingerprint: String,
    pub first_used_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<&super::PaymentMethodInput> for PaymentMethod {
    fn from(input: &super::PaymentMethodInput) -> Self {
        PaymentMethod {
            id: input.id.clone(),
            method_type: input.method_type.clone(),
            provider: input.provider.clone(),
            masked: input.masked.clone(),
            fingerprint: input.fingerprint.clone(),
            first_used_at: input.first_used_at,
            last_used_at: input.last_used_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub kyc_status: String,
    pub risk_score: f64,
    pub attributes: Vec<Attribute>,
    pub payment_methods: Vec<PaymentMethod>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub channel: String,
    pub ip_address: String,
    pub device_id: String,
    pub payment_method_id: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
