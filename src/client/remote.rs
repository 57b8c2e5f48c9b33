//! RemoteClient: network client for a Neo4j-compatible graph store
//!
//! Sends each statement's Cypher and parameters to the HTTP transaction
//! endpoint (`/db/{database}/tx/commit`). Every request commits on its own,
//! so a write statement is applied atomically or not at all.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::query::Statement;

use super::error::{ClientError, ClientResult};
use super::models::{QueryResult, Record};
use super::GraphClient;

/// Connection settings for [`RemoteClient`]
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub uri: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: usize,
    pub timeout: Duration,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            database: "neo4j".to_string(),
            username: String::new(),
            password: String::new(),
            max_connections: 10,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<StoreError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Debug, Deserialize)]
struct DataRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StoreError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Decode a transaction endpoint response body
fn decode_response(body: CommitResponse) -> ClientResult<QueryResult> {
    if let Some(err) = body.errors.into_iter().next() {
        return Err(ClientError::QueryError {
            code: err.code,
            message: err.message,
        });
    }
    let Some(result) = body.results.into_iter().next() else {
        return Ok(QueryResult::empty());
    };
    let records = result
        .data
        .into_iter()
        .map(|d| Record::from_row(&result.columns, d.row))
        .collect();
    Ok(QueryResult {
        columns: result.columns,
        records,
    })
}

/// Network client for a running Neo4j-compatible store.
pub struct RemoteClient {
    commit_url: String,
    options: RemoteOptions,
    http_client: Client,
    closed: AtomicBool,
}

impl RemoteClient {
    /// Create a new RemoteClient from connection options.
    ///
    /// # Example
    /// ```no_run
    /// # use relgraph::client::{RemoteClient, RemoteOptions};
    /// let client = RemoteClient::new(RemoteOptions {
    ///     uri: "http://localhost:7474".to_string(),
    ///     ..Default::default()
    /// }).unwrap();
    /// ```
    pub fn new(options: RemoteOptions) -> ClientResult<Self> {
        let http_client = Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.max_connections)
            .build()?;
        let commit_url = format!(
            "{}/db/{}/tx/commit",
            options.uri.trim_end_matches('/'),
            options.database
        );
        Ok(Self {
            commit_url,
            options,
            http_client,
            closed: AtomicBool::new(false),
        })
    }

    async fn post(&self, cypher: &str, parameters: Value) -> ClientResult<QueryResult> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }
        let body = json!({
            "statements": [{ "statement": cypher, "parameters": parameters }]
        });

        let mut request = self.http_client.post(&self.commit_url).json(&body);
        if !self.options.username.is_empty() {
            request = request.basic_auth(&self.options.username, Some(&self.options.password));
        }
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::ConnectionError(e.to_string())
            } else {
                ClientError::HttpError(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::ConnectionError(format!(
                "store returned {}: {}",
                status, message
            )));
        }

        let body: CommitResponse = response.json().await?;
        decode_response(body)
    }

    async fn run(&self, statement: &Statement) -> ClientResult<QueryResult> {
        debug!(statement = statement.name(), url = %self.commit_url, "remote statement");
        self.post(&statement.cypher(), Value::Object(statement.params())).await
    }
}

#[async_trait]
impl GraphClient for RemoteClient {
    async fn execute_write(&self, statement: &Statement) -> ClientResult<QueryResult> {
        if !statement.is_write() {
            return Err(ClientError::WrongAccessMode(statement.name(), "write"));
        }
        self.run(statement).await
    }

    async fn execute_read(&self, statement: &Statement) -> ClientResult<QueryResult> {
        if statement.is_write() {
            return Err(ClientError::WrongAccessMode(statement.name(), "read"));
        }
        self.run(statement).await
    }

    async fn verify_connectivity(&self) -> ClientResult<()> {
        let result = self.run(&Statement::Ping).await?;
        match result.first().and_then(|r| r.int("ok")) {
            Some(1) => Ok(()),
            _ => Err(ClientError::ConnectionError(
                "connectivity check returned no row".to_string(),
            )),
        }
    }

    async fn close(&self) -> ClientResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: Value) -> ClientResult<QueryResult> {
        decode_response(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_decode_rows() {
        let result = parse(json!({
            "results": [{
                "columns": ["userId", "role"],
                "data": [
                    {"row": ["USR-1", "SENDER"], "meta": [null, null]},
                    {"row": ["USR-2", "RECEIVER"], "meta": [null, null]}
                ]
            }],
            "errors": []
        }))
        .unwrap();
        assert_eq!(result.columns, vec!["userId", "role"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.records[1].string("role"), "RECEIVER");
    }

    #[test]
    fn test_decode_empty_write() {
        let result = parse(json!({
            "results": [{"columns": ["transactionId"], "data": []}],
            "errors": []
        }))
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_decode_store_error() {
        let err = parse(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        }))
        .unwrap_err();
        match err {
            ClientError::QueryError { code, message } => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError");
                assert_eq!(message, "bad");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_access_mode_checked_before_network() {
        let client = RemoteClient::new(RemoteOptions::default()).unwrap();
        assert_eq!(client.commit_url, "http://localhost:7474/db/neo4j/tx/commit");
        let err = client.execute_write(&Statement::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::WrongAccessMode("ping", "write")));

        client.close().await.unwrap();
        let err = client.execute_read(&Statement::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed));
    }
}
