//! Configuration loading
//!
//! Settings come from an optional YAML file and are then overridden by
//! environment variables. Every section is optional in the file.
//!
//! ```yaml
//! graph:
//!   uri: http://localhost:7474
//!   database: neo4j
//!   max_connections: 16
//! ingest:
//!   workers: 8
//! logging:
//!   level: debug
//!   format: json
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::client::RemoteOptions;
use crate::ingest::DEFAULT_WORKERS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Graph store connectivity. An empty `uri` selects the in-process store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Should be at least the ingest worker count
    pub max_connections: usize,
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: "neo4j".to_string(),
            username: String::new(),
            password: String::new(),
            max_connections: 10,
            timeout_secs: 30,
        }
    }
}

impl GraphConfig {
    pub fn is_remote(&self) -> bool {
        !self.uri.trim().is_empty()
    }

    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            uri: self.uri.trim().to_string(),
            database: self.database.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            max_connections: self.max_connections,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `debug`, `info`, `warn` or `error`
    pub level: String,
    /// `text` or `json`
    pub format: String,
    pub color: bool,
    pub include_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            color: false,
            include_caller: false,
        }
    }
}

impl Config {
    /// Load from an optional YAML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply overrides from `lookup`; unset or empty variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GRAPH_URI") {
            self.graph.uri = v;
        }
        if let Some(v) = get("GRAPH_DATABASE") {
            self.graph.database = v;
        }
        if let Some(v) = get("GRAPH_USERNAME") {
            self.graph.username = v;
        }
        if let Some(v) = get("GRAPH_PASSWORD") {
            self.graph.password = v;
        }
        if let Some(v) = get("GRAPH_MAX_CONNECTIONS") {
            self.graph.max_connections = parse_number("GRAPH_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("GRAPH_TIMEOUT_SECS") {
            self.graph.timeout_secs = parse_number("GRAPH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("INGEST_WORKERS") {
            self.ingest.workers = parse_number("INGEST_WORKERS", &v)?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Some(v) = get("LOG_COLOR") {
            self.logging.color = parse_bool(&v).unwrap_or(self.logging.color);
        }
        if let Some(v) = get("LOG_INCLUDE_CALLER") {
            self.logging.include_caller = parse_bool(&v).unwrap_or(self.logging.include_caller);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.graph.is_remote());
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.graph.max_connections, 10);
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml("graph:\n  uri: http://db:7474\ningest:\n  workers: 8\n").unwrap();
        assert!(config.graph.is_remote());
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.ingest.workers, 8);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(Config::from_yaml("  ").unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("GRAPH_URI", "http://graph:7474"),
                ("GRAPH_MAX_CONNECTIONS", "32"),
                ("LOG_FORMAT", "json"),
                ("LOG_COLOR", "TRUE"),
                ("LOG_INCLUDE_CALLER", "maybe"),
                ("GRAPH_DATABASE", ""),
            ]))
            .unwrap();
        assert_eq!(config.graph.uri, "http://graph:7474");
        assert_eq!(config.graph.max_connections, 32);
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.logging.format, "json");
        assert!(config.logging.color);
        assert!(!config.logging.include_caller);

        let options = config.graph.remote_options();
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_number_is_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("INGEST_WORKERS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "INGEST_WORKERS", .. }));
    }
}
