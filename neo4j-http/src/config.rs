// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Client configuration
//!
//! A [`Config`] value is built once at startup (defaults, environment, or a
//! JSON file) and passed explicitly to [`crate::Client::new`]. Nothing in
//! the crate reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default base URL of the HTTP endpoint
pub const DEFAULT_URI: &str = "http://localhost:7474";

/// Query logging verbosity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogLevel {
    /// No instrumentation
    #[default]
    Off,
    /// One line per request with timing and resolved statements
    On,
    /// Additionally logs raw parameters
    Debug,
}

impl std::str::FromStr for QueryLogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "false" | "0" => Ok(QueryLogLevel::Off),
            "on" | "true" | "1" => Ok(QueryLogLevel::On),
            "debug" => Ok(QueryLogLevel::Debug),
            _ => Err(format!(
                "Unknown query log level: {}. Valid options: off, on, debug",
                s
            )),
        }
    }
}

impl std::fmt::Display for QueryLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueryLogLevel::Off => "off",
            QueryLogLevel::On => "on",
            QueryLogLevel::Debug => "debug",
        };
        write!(f, "{}", name)
    }
}

/// Connection and behaviour settings for a [`crate::Client`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL, e.g. `http://localhost:7474`
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Database addressed by `/db/{database_name}/tx`
    pub database_name: String,
    /// Maximum number of pooled connections
    pub connection_pool_size: usize,
    /// How long a checkout waits for a free connection
    pub connection_pool_timeout_ms: u64,
    /// Per-request timeout covering connect, send and receive
    pub request_timeout_ms: u64,
    /// Upper bound on the startup readiness probe
    pub wait_for_upstream_server_ms: u64,
    /// Sleep between readiness probe attempts
    pub upstream_retry_interval_ms: u64,
    /// Return the decoded `results` array instead of mapped result sets
    pub raw_results: bool,
    pub query_log: QueryLogLevel,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            user: Some("neo4j".to_string()),
            password: None,
            database_name: "neo4j".to_string(),
            connection_pool_size: 5,
            connection_pool_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            wait_for_upstream_server_ms: 30_000,
            upstream_retry_interval_ms: 1_000,
            raw_results: false,
            query_log: QueryLogLevel::Off,
            user_agent: format!("neo4j-http/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Defaults overridden by `NEO4J_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(uri) = std::env::var("NEO4J_URL") {
            config.uri = uri;
        }
        if let Ok(user) = std::env::var("NEO4J_USER") {
            config.user = Some(user);
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            config.password = Some(password);
        }
        if let Ok(database) = std::env::var("NEO4J_DATABASE") {
            config.database_name = database;
        }
        if let Some(size) = env_number("NEO4J_HTTP_POOL_SIZE")? {
            config.connection_pool_size = size as usize;
        }
        if let Some(ms) = env_number("NEO4J_HTTP_POOL_TIMEOUT_MS")? {
            config.connection_pool_timeout_ms = ms;
        }
        if let Some(ms) = env_number("NEO4J_HTTP_REQUEST_TIMEOUT_MS")? {
            config.request_timeout_ms = ms;
        }
        if let Some(ms) = env_number("NEO4J_HTTP_WAIT_FOR_SERVER_MS")? {
            config.wait_for_upstream_server_ms = ms;
        }
        if let Ok(level) = std::env::var("NEO4J_HTTP_QUERY_LOG") {
            config.query_log = level.parse().map_err(Error::Configuration)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.user = None;
        self.password = None;
        self
    }

    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.connection_pool_size = size;
        self
    }

    pub fn with_pool_timeout(mut self, timeout: Duration) -> Self {
        self.connection_pool_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Readiness probe bounds
    pub fn with_upstream_wait(mut self, max_wait: Duration, retry_interval: Duration) -> Self {
        self.wait_for_upstream_server_ms = max_wait.as_millis() as u64;
        self.upstream_retry_interval_ms = retry_interval.as_millis() as u64;
        self
    }

    pub fn with_raw_results(mut self, raw: bool) -> Self {
        self.raw_results = raw;
        self
    }

    pub fn with_query_log(mut self, level: QueryLogLevel) -> Self {
        self.query_log = level;
        self
    }

    /// Check invariants the pool and executor rely on
    pub fn validate(&self) -> Result<()> {
        if !(self.uri.starts_with("http://") || self.uri.starts_with("https://")) {
            return Err(Error::Configuration(format!(
                "Invalid connection URL '{}': expected http:// or https://",
                self.uri
            )));
        }
        if self.database_name.trim().is_empty() {
            return Err(Error::Configuration("database_name must not be empty".into()));
        }
        if self.connection_pool_size == 0 {
            return Err(Error::Configuration(
                "connection_pool_size must be at least 1".into(),
            ));
        }
        if self.upstream_retry_interval_ms == 0 {
            return Err(Error::Configuration(
                "upstream_retry_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.uri.trim_end_matches('/')
    }

    pub fn connection_pool_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_pool_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn wait_for_upstream_server(&self) -> Duration {
        Duration::from_millis(self.wait_for_upstream_server_ms)
    }

    pub fn upstream_retry_interval(&self) -> Duration {
        Duration::from_millis(self.upstream_retry_interval_ms)
    }

    /// Number of readiness retries after the first attempt
    pub fn upstream_retries(&self) -> u64 {
        self.wait_for_upstream_server_ms
            .div_ceil(self.upstream_retry_interval_ms.max(1))
    }
}

fn env_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::Configuration(format!("{}='{}': {}", name, value, e))),
        Err(_) => Ok(None),
    }
}
