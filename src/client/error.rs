//! Error types for graph store clients

use crate::graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The store rejected or failed to run a statement
    #[error("Query error: {code}: {message}")]
    QueryError { code: String, message: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A transaction write matched no sender or receiver user
    #[error("sender {sender} or receiver {receiver} does not exist")]
    MissingParticipant { sender: String, receiver: String },

    /// Statement not valid for the requested access mode
    #[error("{0} is not a {1} statement")]
    WrongAccessMode(&'static str, &'static str),

    #[error("Client is closed")]
    Closed,

    #[error("Graph error: {0}")]
    GraphError(#[from] GraphError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
