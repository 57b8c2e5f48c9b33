//! Engine error types
//!
//! Single-item operations return [`EngineError`]. Bulk ingestion returns
//! [`IngestError`], which is either the cancellation signal or a
//! [`TaskError`] listing every failed item with its business key.

use crate::client::ClientError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A required business key is missing; the item is not retried
    #[error("validation error: {0}")]
    Validation(String),

    /// The store failed or rejected the statement for `key`
    #[error("store error for {key}: {source}")]
    Store { key: String, source: ClientError },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A bulk worker task died before reporting its item
    #[error("worker failed: {0}")]
    Worker(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn store(key: impl Into<String>, source: ClientError) -> Self {
        EngineError::Store {
            key: key.into(),
            source,
        }
    }

    /// True for the cancellation and deadline signals
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EngineError::Cancelled | EngineError::DeadlineExceeded)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// One failed item of a bulk operation
#[derive(Debug)]
pub struct TaskFailure {
    pub key: String,
    pub error: EngineError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

/// Every item failure of a bulk operation, in the order they were collected
#[derive(Debug, Default)]
pub struct TaskError {
    pub failures: Vec<TaskFailure>,
}

impl TaskError {
    pub fn push(&mut self, key: impl Into<String>, error: EngineError) {
        self.failures.push(TaskFailure {
            key: key.into(),
            error,
        });
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Business keys of the failed items
    pub fn keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), TaskError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.failures.as_slice() {
            return write!(f, "{}", only);
        }
        write!(f, "multiple errors: ")?;
        for failure in &self.failures {
            write!(f, "{}; ", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for TaskError {}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("ingestion cancelled")]
    Cancelled,

    #[error("ingestion deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Tasks(#[from] TaskError),
}

impl IngestError {
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            IngestError::Tasks(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        let mut single = TaskError::default();
        single.push("user USR-1", EngineError::validation("user id is required"));
        assert_eq!(single.to_string(), "user USR-1: validation error: user id is required");

        let mut many = TaskError::default();
        many.push("a", EngineError::validation("x"));
        many.push("b", EngineError::store("b", ClientError::Closed));
        assert_eq!(
            many.to_string(),
            "multiple errors: a: validation error: x; b: store error for b: Client is closed; "
        );
        assert_eq!(many.keys(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_task_error_is_ok() {
        assert!(TaskError::default().into_result().is_ok());
        assert!(EngineError::DeadlineExceeded.is_cancellation());
        assert!(!EngineError::validation("x").is_cancellation());
    }
}
