//! Attribute normalization and fingerprinting
//!
//! Identity-bearing fields are canonicalized, hashed with SHA-256 and tagged
//! with a type and a fixed confidence score. Two records share an attribute
//! node exactly when their canonical strings hash identically.

use crate::model::{AddressInput, Attribute, AttributeInput, AttributeType, TransactionInput, UserInput};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Confidence of a payment method referenced from a transaction
pub const TRANSACTION_PAYMENT_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to custom attributes supplied without one
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Derives attribute fingerprints from ingestion payloads
pub trait AttributeGenerator: Send + Sync {
    fn attributes_for_user(&self, input: &UserInput) -> Vec<Attribute>;
    fn attributes_for_transaction(&self, input: &TransactionInput) -> Vec<Attribute>;
}

/// Built-in normalization rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAttributeGenerator;

impl AttributeGenerator for DefaultAttributeGenerator {
    fn attributes_for_user(&self, input: &UserInput) -> Vec<Attribute> {
        let mut attrs = Vec::new();

        let email = normalize_email(&input.email);
        if !email.is_empty() {
            attrs.push(derived(AttributeType::Email, email));
        }

        let phone = normalize_phone(&input.phone);
        if !phone.is_empty() {
            attrs.push(derived(AttributeType::Phone, phone));
        }

        let address = normalize_address(&input.address);
        if !address.trim_matches('|').is_empty() {
            attrs.push(derived(AttributeType::Address, address));
        }

        let mut seen = HashSet::new();
        for pm in &input.payment_methods {
            let mut identifier = pm.fingerprint.trim();
            if identifier.is_empty() {
                identifier = pm.id.trim();
            }
            if identifier.is_empty() || !seen.insert(identifier) {
                continue;
            }
            attrs.push(derived(AttributeType::PaymentMethod, identifier.to_string()));
        }

        attrs
    }

    fn attributes_for_transaction(&self, input: &TransactionInput) -> Vec<Attribute> {
        let mut attrs = Vec::new();

        let ip = input.ip_address.trim();
        if !ip.is_empty() {
            attrs.push(derived(AttributeType::IpAddress, ip.to_string()));
        }

        let device = input.device_id.trim();
        if !device.is_empty() {
            attrs.push(derived(AttributeType::Device, device.to_string()));
        }

        let payment = input.payment_method_id.trim();
        if !payment.is_empty() {
            attrs.push(Attribute::new(
                AttributeType::PaymentMethod.as_str(),
                hash_value(payment),
                payment,
                TRANSACTION_PAYMENT_CONFIDENCE,
            ));
        }

        // Day bucket: identity is the UTC date, display keeps the full instant
        let day = input.timestamp.format("%Y-%m-%d").to_string();
        attrs.push(Attribute::new(
            AttributeType::TxDayBucket.as_str(),
            hash_value(&day),
            input.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            AttributeType::TxDayBucket.confidence(),
        ));

        attrs
    }
}

fn derived(attribute_type: AttributeType, canonical: String) -> Attribute {
    Attribute {
        attribute_type: attribute_type.as_str().to_string(),
        value: hash_value(&canonical),
        raw_value: canonical,
        confidence_score: attribute_type.confidence(),
    }
}

/// Trim and lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Digits only, international `00` prefix dropped, leading `+` ensured.
/// Returns an empty string when there are no digits.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    let digits = digits.strip_prefix("00").unwrap_or(&digits);
    format!("+{}", digits)
}

/// Lowercased, trimmed components joined by `|` in a fixed order
pub fn normalize_address(addr: &AddressInput) -> String {
    [
        &addr.line1,
        &addr.line2,
        &addr.city,
        &addr.state,
        &addr.postal_code,
        &addr.country,
    ]
    .iter()
    .map(|part| part.trim().to_lowercase())
    .collect::<Vec<_>>()
    .join("|")
}

/// Lowercase hex SHA-256
pub fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Collapse runs of whitespace to one space and trim
pub fn sanitize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Caller attributes pass through unhashed; incomplete entries are dropped.
pub fn convert_custom_attributes(attrs: &[AttributeInput]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|a| !a.attribute_type.is_empty() && !a.value.is_empty())
        .map(|a| {
            let confidence = if a.confidence_score == 0.0 {
                DEFAULT_CONFIDENCE
            } else {
                a.confidence_score
            };
            Attribute::new(&a.attribute_type, &a.value, &a.raw_value, confidence)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethodInput;
    use chrono::{TimeZone, Utc};

    fn sample_user() -> UserInput {
        UserInput {
            id: "USR-1".to_string(),
            full_name: "  Jane   Doe ".to_string(),
            email: "Jane.Doe@Example.com ".to_string(),
            phone: " +1 (555) 123-4567 ".to_string(),
            address: AddressInput {
                line1: "123 Market St".to_string(),
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                postal_code: "94105".to_string(),
                country: "US".to_string(),
                ..Default::default()
            },
            payment_methods: vec![
                PaymentMethodInput {
                    id: "PM-1".to_string(),
                    fingerprint: "FP-123".to_string(),
                    ..Default::default()
                },
                PaymentMethodInput {
                    id: "PM-2".to_string(),
                    fingerprint: " FP-123 ".to_string(),
                    ..Default::default()
                },
                PaymentMethodInput {
                    id: "PM-3".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" +1 (555) 123-4567 "), "+15551234567");
        assert_eq!(normalize_phone("0044 20 7946 0958"), "+442079460958");
        assert_eq!(normalize_phone("n/a"), "");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_normalize_address() {
        let addr = AddressInput {
            line1: " 1 Market St ".to_string(),
            city: "SF".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize_address(&addr), "1 market st||sf|||");
        assert_eq!(normalize_address(&AddressInput::default()), "|||||");
    }

    #[test]
    fn test_hash_value() {
        assert_eq!(
            hash_value("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  Jane \t  Doe\n"), "Jane Doe");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_user_attributes() {
        let attrs = DefaultAttributeGenerator.attributes_for_user(&sample_user());
        let types: Vec<_> = attrs.iter().map(|a| a.attribute_type.as_str()).collect();
        assert_eq!(types, vec!["EMAIL", "PHONE", "ADDRESS", "PAYMENT_METHOD", "PAYMENT_METHOD"]);

        assert_eq!(attrs[0].raw_value, "jane.doe@example.com");
        assert_eq!(attrs[0].value, hash_value("jane.doe@example.com"));
        assert_eq!(attrs[0].confidence_score, 1.0);
        assert_eq!(attrs[1].raw_value, "+15551234567");
        assert_eq!(attrs[2].raw_value, "123 market st||san francisco|ca|94105|us");
        assert_eq!(attrs[2].confidence_score, 0.9);
        // Fingerprint dedup, then id fallback
        assert_eq!(attrs[3].raw_value, "FP-123");
        assert_eq!(attrs[4].raw_value, "PM-3");
        assert_eq!(attrs[4].confidence_score, 0.95);
    }

    #[test]
    fn test_empty_user_has_no_attributes() {
        let attrs = DefaultAttributeGenerator.attributes_for_user(&UserInput::default());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_transaction_attributes() {
        let tx = TransactionInput {
            id: "TX-1".to_string(),
            ip_address: " 10.0.0.1 ".to_string(),
            device_id: "device-000001".to_string(),
            payment_method_id: "PM-1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 4, 20, 23, 59, 30).unwrap(),
            ..Default::default()
        };
        let attrs = DefaultAttributeGenerator.attributes_for_transaction(&tx);
        let scores: Vec<_> = attrs.iter().map(|a| (a.attribute_type.as_str(), a.confidence_score)).collect();
        assert_eq!(
            scores,
            vec![("IP", 0.85), ("DEVICE", 0.9), ("PAYMENT_METHOD", 0.9), ("TX_DAY_BUCKET", 0.5)]
        );
        assert_eq!(attrs[0].raw_value, "10.0.0.1");
        assert_eq!(attrs[3].value, hash_value("2024-04-20"));
        assert_eq!(attrs[3].raw_value, "2024-04-20T23:59:30Z");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let user = sample_user();
        let gen = DefaultAttributeGenerator;
        assert_eq!(gen.attributes_for_user(&user), gen.attributes_for_user(&user));

        let tx = TransactionInput {
            ip_address: "10.0.0.1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ..Default::default()
        };
        assert_eq!(gen.attributes_for_transaction(&tx), gen.attributes_for_transaction(&tx));
    }

    #[test]
    fn test_custom_attributes() {
        let custom = vec![
            AttributeInput {
                attribute_type: "BUSINESS".to_string(),
                value: "acme".to_string(),
                raw_value: "Acme Corp".to_string(),
                confidence_score: 0.0,
            },
            AttributeInput {
                attribute_type: "CUSTOM".to_string(),
                value: "x".to_string(),
                raw_value: String::new(),
                confidence_score: 0.4,
            },
            AttributeInput {
                attribute_type: String::new(),
                value: "dropped".to_string(),
                ..Default::default()
            },
        ];
        let attrs = convert_custom_attributes(&custom);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].value, "acme");
        assert_eq!(attrs[0].confidence_score, 1.0);
        assert_eq!(attrs[1].confidence_score, 0.4);
    }
}
