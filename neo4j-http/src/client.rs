// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Client entry point
//!
//! The [`Client`] owns the connection pool and wires pool, executor,
//! transactions and one-shot requests together.
//!
//! ```no_run
//! use neo4j_http::{AccessMode, Client, Config, Statement};
//!
//! # fn main() -> neo4j_http::Result<()> {
//! let client = Client::new(Config::from_env()?)?;
//!
//! let count = client.with_transaction(AccessMode::Write, |tx| {
//!     tx.run(Statement::new("CREATE (n:User {name: $name})").param("name", "Klaus"))?;
//!     tx.run("MATCH (n:User) RETURN count(n) AS count")
//! })?;
//! println!("{:?}", count.single_value());
//!
//! // The application is responsible for closing the pool on exit.
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::collector::StatementCollector;
use crate::config::Config;
use crate::error::{Error, ResponseError, Result};
use crate::executor::{AccessMode, RequestExecutor};
use crate::pool::ConnectionPool;
use crate::query_log::QueryLogger;
use crate::result::{ResponseHook, ResultMapper, Results};
use crate::statement::{encode, Parameters, Statement};
use crate::transaction::Transaction;

/// Discovery document served at the server root
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerInfo {
    pub neo4j_version: String,
    #[serde(default)]
    pub neo4j_edition: Option<String>,
    /// URL template of the transactional endpoint
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub bolt_direct: Option<String>,
    #[serde(default)]
    pub bolt_routing: Option<String>,
}

pub struct Client {
    config: Arc<Config>,
    pool: ConnectionPool,
    hook: Option<ResponseHook>,
    request_counter: Arc<AtomicU64>,
}

impl Client {
    /// Validate `config` and set up an empty pool; no connection is made yet
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            pool: ConnectionPool::new(Arc::clone(&config)),
            config,
            hook: None,
            request_counter: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Rewrite every response body before it is decoded
    pub fn with_response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Requests timed by the query log so far
    pub fn requests_logged(&self) -> u64 {
        self.request_counter
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Check out a connection and bind an executor to it
    pub fn executor(&self, mode: AccessMode) -> Result<RequestExecutor> {
        let connection = self.pool.acquire()?;
        self.pool.ensure_server_ready(&connection)?;

        Ok(RequestExecutor::new(
            connection,
            self.config.database_name.clone(),
            mode,
            ResultMapper::new(self.config.raw_results, self.hook.clone()),
            QueryLogger::new(self.config.query_log, Arc::clone(&self.request_counter)),
        ))
    }

    /// A transaction that has not been started yet
    pub fn transaction(&self, mode: AccessMode) -> Result<Transaction> {
        Ok(Transaction::new(self.executor(mode)?))
    }

    /// A transaction already accepted by the server
    pub fn begin_transaction(&self, mode: AccessMode) -> Result<Transaction> {
        let mut tx = self.transaction(mode)?;
        tx.begin()?;
        Ok(tx)
    }

    /// Run `body` inside a transaction.
    ///
    /// An error from `body` rolls the transaction back and is returned as is.
    /// Otherwise the transaction is committed if `body` left it open. The
    /// transaction is cleaned up on every path; on unwinding its `Drop`
    /// rolls back and returns the connection.
    pub fn with_transaction<T, F>(&self, mode: AccessMode, body: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let mut tx = self.begin_transaction(mode)?;

        let result = match body(&mut tx) {
            Ok(value) if tx.is_open() => tx.commit(&[]).map(|_| value),
            Ok(value) => Ok(value),
            Err(e) => {
                if tx.is_open() {
                    if let Err(rollback_error) = tx.rollback() {
                        log::warn!(
                            "Rollback after failed transaction body also failed: {}",
                            rollback_error
                        );
                    }
                }
                Err(e)
            }
        };

        tx.cleanup();
        result
    }

    /// Tolerant form of [`Client::with_transaction`].
    ///
    /// Recoverable failures while beginning, inside `body`, or on commit
    /// yield `Ok(None)`. A failed commit counts as rolled back and is not
    /// retried. Errors outside the recoverable family still propagate.
    pub fn with_transaction_quietly<T, F>(&self, mode: AccessMode, body: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let mut tx = match self.transaction(mode) {
            Ok(tx) => tx,
            Err(e) if e.is_recoverable() => {
                log::warn!("Could not start transaction: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if tx.begin_quietly()?.is_none() {
            return Ok(None);
        }

        let result = match body(&mut tx) {
            Ok(value) if tx.is_open() => tx.commit_quietly(&[]).map(|c| c.map(|_| value)),
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                if tx.is_open() {
                    // Tolerant rollback never raises a recoverable error.
                    tx.rollback_quietly()?;
                }
                if e.is_recoverable() {
                    log::warn!("Transaction body failed: {}", e);
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        };

        tx.cleanup();
        result
    }

    /// Collect statements with `body` and send them as one one-shot request.
    ///
    /// A body that adds no statements is `InvalidArgument`; no connection
    /// is taken in that case.
    pub fn with_one_shot<F>(&self, mode: AccessMode, body: F) -> Result<Results>
    where
        F: FnOnce(&mut StatementCollector),
    {
        let mut collector = StatementCollector::new();
        body(&mut collector);

        if collector.is_empty() {
            return Err(Error::InvalidArgument(
                "one-shot transaction needs at least one statement".to_string(),
            ));
        }

        self.executor(mode)?.one_shot_transaction(collector.statements())
    }

    /// Send `statements` as one one-shot request
    pub fn one_shot(&self, mode: AccessMode, statements: &[Statement]) -> Result<Results> {
        self.executor(mode)?.one_shot_transaction(statements)
    }

    /// One statement as a one-shot request
    pub fn run_query(&self, mode: AccessMode, text: &str, parameters: Parameters) -> Result<Results> {
        self.one_shot(mode, &[encode(text, parameters)])
    }

    /// Fetch the server's discovery document
    pub fn server_info(&self) -> Result<ServerInfo> {
        let connection = self.pool.acquire()?;
        let response = connection.get("/")?;

        if !response.is_success() {
            return Err(Error::Response(
                ResponseError::new(None, response.body).with_response(response.status, response.url),
            ));
        }

        serde_json::from_str(&response.body).map_err(|e| Error::InvalidJson(e.to_string()))
    }

    /// Close all pooled connections. Call once on application shutdown.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("uri", &self.config.uri)
            .field("database", &self.config.database_name)
            .field("pool", &self.pool)
            .field("response_hook", &self.hook.is_some())
            .finish()
    }
}
