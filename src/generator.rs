//! Synthetic dataset generator
//!
//! Produces users and transactions shaped like production traffic, with a
//! configurable share of reused emails, phones, addresses, payment methods,
//! IPs and devices so that attribute links actually appear in the graph.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::model::{AddressInput, PaymentMethodInput, TransactionInput, UserInput};

pub const USERS_FILE: &str = "users.json";
pub const TRANSACTIONS_FILE: &str = "transactions.json";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub num_users: usize,
    pub num_transactions: usize,
    /// Chance that a user reuses an existing email, phone or address
    pub shared_attribute_chance: f64,
    pub payment_method_share_chance: f64,
    pub ip_share_chance: f64,
    pub device_share_chance: f64,
    /// Zero picks a time-based seed
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_users: 10_000,
            num_transactions: 100_000,
            shared_attribute_chance: 0.35,
            payment_method_share_chance: 0.25,
            ip_share_chance: 0.25,
            device_share_chance: 0.3,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    /// Replace non-positive settings with their defaults
    fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.num_users == 0 {
            self.num_users = defaults.num_users;
        }
        if self.num_transactions == 0 {
            self.num_transactions = defaults.num_transactions;
        }
        if self.shared_attribute_chance <= 0.0 {
            self.shared_attribute_chance = defaults.shared_attribute_chance;
        }
        if self.payment_method_share_chance <= 0.0 {
            self.payment_method_share_chance = defaults.payment_method_share_chance;
        }
        if self.ip_share_chance <= 0.0 {
            self.ip_share_chance = defaults.ip_share_chance;
        }
        if self.device_share_chance <= 0.0 {
            self.device_share_chance = defaults.device_share_chance;
        }
        if self.seed == 0 {
            self.seed = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        }
        self
    }
}

/// Generated users and the transactions between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub users: Vec<UserInput>,
    pub transactions: Vec<TransactionInput>,
}

impl Dataset {
    /// Write `users.json` and `transactions.json` under `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> DatasetResult<()> {
        std::fs::create_dir_all(dir).map_err(|source| DatasetError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        write_json(&dir.join(USERS_FILE), &self.users)?;
        write_json(&dir.join(TRANSACTIONS_FILE), &self.transactions)?;
        Ok(())
    }

    pub fn load_from_dir(dir: &Path) -> DatasetResult<Self> {
        Ok(Dataset {
            users: read_json(&dir.join(USERS_FILE))?,
            transactions: read_json(&dir.join(TRANSACTIONS_FILE))?,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> DatasetResult<()> {
    let display = path.display().to_string();
    let file = File::create(path).map_err(|source| DatasetError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), data)
        .map_err(|source| DatasetError::Json { path: display, source })
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| DatasetError::Json { path: display, source })
}

const FIRST_NAMES: &[&str] = &[
    "Jane", "John", "Alex", "Priya", "Liu", "Maria", "Omar", "Sofia", "Noah", "Emma", "Lucas", "Mia",
    "Ava", "Ethan", "Zara",
];
const LAST_NAMES: &[&str] = &[
    "Doe", "Smith", "Chen", "Patel", "Garcia", "Khan", "Kim", "Ivanov", "Nguyen", "Silva", "Brown", "Lee",
];
const DOMAINS: &[&str] = &["example.com", "mail.com", "fintrace.io", "payments.net", "securepay.org"];
const STREETS: &[&str] = &[
    "Market", "Mission", "Broadway", "Fifth", "Sunset", "Park", "Cedar", "Oak", "Pine", "Ash",
];
const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Ln", "Rd", "Way"];
const CITIES: &[&str] = &[
    "San Francisco", "New York", "Seattle", "Austin", "Chicago", "Miami", "Denver", "Boston", "Los Angeles",
];
const STATES: &[&str] = &["CA", "NY", "WA", "TX", "IL", "FL", "CO", "MA"];
const KYC_STATUSES: &[&str] = &["PENDING", "VERIFIED", "REVIEW"];
const METHOD_TYPES: &[&str] = &["CARD", "BANK_ACCOUNT", "WALLET"];
const PROVIDERS: &[&str] = &["VISA", "MASTERCARD", "AMEX", "DISCOVER", "PAYPAL", "STRIPE"];
const TX_TYPES: &[&str] = &["TRANSFER", "PAYMENT", "WITHDRAWAL", "DEPOSIT"];
const CHANNELS: &[&str] = &["WEB", "MOBILE", "POS", "API"];
const NOTES: &[&str] = &[
    "Invoice settlement", "Freelance payout", "Peer transfer", "Market purchase", "Crypto off-ramp",
];
const MERCHANT_CATEGORIES: &[&str] = &["REMITTANCE", "PAYROLL", "E_COMMERCE", "CRYPTO", "GAMBLING", "DONATION"];

/// Values handed out once and possibly reused by later records
#[derive(Default)]
struct Pools {
    emails: Vec<String>,
    phones: Vec<String>,
    addresses: Vec<AddressInput>,
    payments: Vec<PaymentMethodInput>,
    ips: Vec<String>,
    devices: Vec<String>,
}

pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
    pools: Pools,
    now: DateTime<Utc>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let config = config.normalized();
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            pools: Pools::default(),
            now: Utc::now(),
        }
    }

    /// Anchor generated timestamps to `now` instead of the wall clock
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn generate(&mut self) -> Dataset {
        let users: Vec<UserInput> = (0..self.config.num_users).map(|i| self.user(i)).collect();

        // A lone user can only transact with itself
        let transactions = if users.len() < 2 {
            Vec::new()
        } else {
            (0..self.config.num_transactions)
                .map(|i| self.transaction(i, &users))
                .collect()
        };

        info!(
            users = users.len(),
            transactions = transactions.len(),
            seed = self.config.seed,
            "generated dataset"
        );
        Dataset { users, transactions }
    }

    fn user(&mut self, index: usize) -> UserInput {
        let user_id = format!("USR-{:06}", index + 1);
        let created_at = self.now - Duration::hours(self.rng.gen_range(0..365 * 24));
        let updated_at = created_at + Duration::hours(self.rng.gen_range(0..72));

        let chance = self.config.shared_attribute_chance;
        let email = self.maybe_shared(|p| &mut p.emails, chance, Self::random_email);
        let phone = self.maybe_shared(|p| &mut p.phones, chance, Self::random_phone);
        let address = self.maybe_shared(|p| &mut p.addresses, chance, Self::random_address);
        let payment_methods = self.payment_methods(&user_id);

        let dob = Utc
            .with_ymd_and_hms(
                1960 + self.rng.gen_range(0..30),
                1 + self.rng.gen_range(0..12),
                1 + self.rng.gen_range(0..28),
                0,
                0,
                0,
            )
            .single();

        UserInput {
            full_name: format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES)),
            email,
            phone,
            address,
            date_of_birth: dob,
            kyc_status: self.pick(KYC_STATUSES).to_string(),
            risk_score: self.rng.gen::<f64>(),
            payment_methods,
            attributes: Vec::new(),
            created_at: Some(created_at),
            updated_at: Some(updated_at),
            id: user_id,
        }
    }

    fn transaction(&mut self, index: usize, users: &[UserInput]) -> TransactionInput {
        let sender_idx = self.rng.gen_range(0..users.len());
        let mut receiver_idx = self.rng.gen_range(0..users.len());
        if sender_idx == receiver_idx {
            receiver_idx = (receiver_idx + 1) % users.len();
        }
        let sender = &users[sender_idx];
        let receiver = &users[receiver_idx];

        let amount = self.rng.gen::<f64>() * 4900.0 + 100.0;
        let ip_chance = self.config.ip_share_chance;
        let ip = self.maybe_shared(|p| &mut p.ips, ip_chance, Self::random_ip);
        let device_chance = self.config.device_share_chance;
        let device = self.maybe_shared(|p| &mut p.devices, device_chance, Self::random_device);
        let payment_method_id = sender
            .payment_methods
            .choose(&mut self.rng)
            .map(|pm| pm.id.clone())
            .unwrap_or_default();

        let timestamp = self.now - Duration::minutes(self.rng.gen_range(0..60 * 24));
        let created_at = timestamp - Duration::minutes(self.rng.gen_range(0..120));
        let updated_at = timestamp + Duration::minutes(self.rng.gen_range(0..120));

        let mut metadata = serde_json::Map::new();
        metadata.insert("merchantCategory".to_string(), self.pick(MERCHANT_CATEGORIES).into());
        metadata.insert("note".to_string(), self.pick(NOTES).into());

        TransactionInput {
            id: format!("TX-{:07}", index + 1),
            sender_user_id: sender.id.clone(),
            receiver_user_id: receiver.id.clone(),
            amount,
            currency: "USD".to_string(),
            tx_type: self.pick(TX_TYPES).to_string(),
            status: "COMPLETED".to_string(),
            channel: self.pick(CHANNELS).to_string(),
            ip_address: ip,
            device_id: device,
            payment_method_id,
            timestamp,
            metadata: Some(metadata),
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    /// With probability `chance` reuse a pooled value, otherwise mint and pool a new one
    fn maybe_shared<T, P, F>(&mut self, pool: P, chance: f64, fresh: F) -> T
    where
        T: Clone,
        P: Fn(&mut Pools) -> &mut Vec<T>,
        F: FnOnce(&mut Self) -> T,
    {
        let len = pool(&mut self.pools).len();
        if len > 0 && self.rng.gen::<f64>() < chance {
            let idx = self.rng.gen_range(0..len);
            return pool(&mut self.pools)[idx].clone();
        }
        let value = fresh(self);
        pool(&mut self.pools).push(value.clone());
        value
    }

    fn payment_methods(&mut self, user_id: &str) -> Vec<PaymentMethodInput> {
        let count = 1 + self.rng.gen_range(0..2);
        let mut methods = Vec::with_capacity(count);
        for i in 0..count {
            if !self.pools.payments.is_empty() && self.rng.gen::<f64>() < self.config.payment_method_share_chance {
                let idx = self.rng.gen_range(0..self.pools.payments.len());
                methods.push(self.pools.payments[idx].clone());
                continue;
            }
            let pm = PaymentMethodInput {
                id: format!("PM-{}-{}", user_id, i + 1),
                method_type: self.pick(METHOD_TYPES).to_string(),
                provider: self.pick(PROVIDERS).to_string(),
                masked: format!(
                    "{:04}********{:04}",
                    self.rng.gen_range(0..10_000),
                    self.rng.gen_range(0..10_000)
                ),
                fingerprint: format!("fp-{}-{}", user_id, self.rng.gen_range(0..1000)),
                first_used_at: None,
                last_used_at: None,
            };
            if self.rng.gen::<f64>() < 0.5 {
                self.pools.payments.push(pm.clone());
            }
            methods.push(pm);
        }
        methods
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        options[self.rng.gen_range(0..options.len())]
    }

    fn random_email(&mut self) -> String {
        let domain = self.pick(DOMAINS);
        format!("{}.{}@{}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES), domain)
    }

    fn random_phone(&mut self) -> String {
        format!(
            "+1{:03}{:03}{:04}",
            self.rng.gen_range(100..1000),
            self.rng.gen_range(100..1000),
            self.rng.gen_range(0..10_000)
        )
    }

    fn random_address(&mut self) -> AddressInput {
        AddressInput {
            line1: format!(
                "{} {} {}",
                self.rng.gen_range(1..10_000),
                self.pick(STREETS),
                self.pick(STREET_SUFFIXES)
            ),
            line2: String::new(),
            city: self.pick(CITIES).to_string(),
            state: self.pick(STATES).to_string(),
            postal_code: format!("{:05}", self.rng.gen_range(0..99_999)),
            country: "US".to_string(),
        }
    }

    fn random_ip(&mut self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.rng.gen_range(1..224),
            self.rng.gen_range(0..256),
            self.rng.gen_range(0..256),
            self.rng.gen_range(0..256)
        )
    }

    fn random_device(&mut self) -> String {
        format!("device-{:06}", self.rng.gen_range(0..999_999))
    }
}
