//! Relgraph relationship engine
//!
//! Maintains a property graph of users, transactions and the identifying
//! attributes they share (emails, phones, addresses, payment methods, IPs,
//! devices), and answers relationship questions over it.
//!
//! # Layers
//!
//! - [`normalize`]: attribute fingerprints (normalize, then SHA-256)
//! - [`query`]: typed statements with Cypher rendering
//! - [`client`]: graph store clients (in-process and remote)
//! - [`repository`]: idempotent upserts and relationship reads
//! - [`service`]: input validation, pagination and the public operations
//! - [`ingest`]: bounded-concurrency bulk ingestion with error aggregation
//! - [`generator`]: synthetic datasets with controllable attribute sharing
//!
//! # Example
//!
//! ```no_run
//! use relgraph::{EmbeddedClient, RelationshipService, Repository};
//! use std::sync::Arc;
//!
//! # async fn run() -> relgraph::EngineResult<()> {
//! let repo = Repository::new(Arc::new(EmbeddedClient::new()));
//! let service = RelationshipService::new(Arc::new(repo));
//! let links = service.user_relationships("USR-000001").await?;
//! println!("{} direct links", links.direct_links.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod algo;
pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod query;
pub mod repository;
pub mod service;

pub use client::{ClientError, ClientResult, EmbeddedClient, GraphClient, QueryResult, Record, RemoteClient, RemoteOptions};
pub use config::{Config, ConfigError};
pub use error::{EngineError, EngineResult, IngestError, TaskError, TaskFailure};
pub use generator::{Dataset, DatasetError, Generator, GeneratorConfig};
pub use graph::{GraphError, GraphStore};
pub use ingest::{bounded_parallel_map, BulkIngestor, IngestContext};
pub use normalize::{AttributeGenerator, DefaultAttributeGenerator};
pub use repository::{Clock, GraphRepository, Repository};
pub use service::RelationshipService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.3.0");
    }
}
