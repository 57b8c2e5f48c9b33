//! Result rows returned by graph clients
//!
//! Store values arrive as loosely typed JSON. The conversion helpers here
//! are total: a missing column or a value of an unexpected type decodes to
//! the empty string, zero, `None` or an empty list.

use crate::model::parse_time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Pair columns with a positional row
    pub fn from_row(columns: &[String], row: Vec<Value>) -> Self {
        Record(columns.iter().cloned().zip(row).collect())
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn string(&self, column: &str) -> String {
        self.get(column).map(to_string).unwrap_or_default()
    }

    pub fn float(&self, column: &str) -> f64 {
        self.get(column).map(to_f64).unwrap_or(0.0)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(to_i64)
    }

    pub fn time(&self, column: &str) -> Option<DateTime<Utc>> {
        self.get(column).and_then(to_time)
    }

    pub fn list(&self, column: &str) -> &[Value] {
        match self.get(column) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Non-empty strings of a list column
    pub fn string_list(&self, column: &str) -> Vec<String> {
        self.list(column)
            .iter()
            .map(to_string)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

pub fn to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

pub fn to_f64(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

pub fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

pub fn to_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time(s),
        _ => None,
    }
}

/// Result of executing a statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl QueryResult {
    pub fn new(columns: &[&str], records: Vec<Record>) -> Self {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of result records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}
