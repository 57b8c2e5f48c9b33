//! Graph store clients
//!
//! Two implementations of [`GraphClient`]:
//!
//! - **`EmbeddedClient`**: in-process [`GraphStore`](crate::graph::GraphStore)
//!   behind a tokio `RwLock`; interprets statements directly. Used by tests,
//!   benches and the CLI when no store URI is configured.
//! - **`RemoteClient`**: Neo4j-compatible store reached over the HTTP
//!   transaction endpoint; sends each statement's Cypher and parameters.

pub mod embedded;
pub mod error;
pub mod models;
pub mod remote;

pub use embedded::EmbeddedClient;
pub use error::{ClientError, ClientResult};
pub use models::{QueryResult, Record};
pub use remote::{RemoteClient, RemoteOptions};

use crate::query::Statement;
use async_trait::async_trait;

/// Store capability consumed by the repository
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Execute a mutating statement atomically
    async fn execute_write(&self, statement: &Statement) -> ClientResult<QueryResult>;

    /// Execute a read-only statement
    async fn execute_read(&self, statement: &Statement) -> ClientResult<QueryResult>;

    /// Round-trip to the store
    async fn verify_connectivity(&self) -> ClientResult<()>;

    /// Release resources; later calls fail with [`ClientError::Closed`]
    async fn close(&self) -> ClientResult<()>;
}
