// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! HTTP calls of the transactional protocol
//!
//! | operation | request |
//! |---|---|
//! | begin | `POST /db/{db}/tx` with `Access-Mode`, answer carries `Location: .../tx/{id}` |
//! | run | `POST /db/{db}/tx/{id}` |
//! | commit | `POST /db/{db}/tx/{id}/commit` |
//! | rollback | `DELETE /db/{db}/tx/{id}` |
//! | one-shot | `POST /db/{db}/tx/commit` |
//!
//! A [`RequestExecutor`] owns one pooled connection for its whole lifetime
//! and gives it back to the pool when dropped.

use serde_json::json;
use std::fmt;

use crate::error::{Error, ResponseError, Result};
use crate::pool::{HttpResponse, PooledConnection};
use crate::query_log::{QueryLogger, RequestLabel};
use crate::result::{ResultMapper, Results};
use crate::statement::{statements_payload, Statement};
use crate::transaction::TransactionId;

/// Request header selecting the routing mode of a transaction
pub const ACCESS_MODE_HEADER: &str = "Access-Mode";

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    Read,
    #[default]
    Write,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "READ",
            AccessMode::Write => "WRITE",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READ" | "R" => Ok(AccessMode::Read),
            "WRITE" | "W" => Ok(AccessMode::Write),
            _ => Err(format!("Unknown access mode: {}. Valid options: read, write", s)),
        }
    }
}

/// Issues the transactional HTTP requests over one pooled connection
pub struct RequestExecutor {
    connection: PooledConnection,
    database: String,
    access_mode: AccessMode,
    mapper: ResultMapper,
    logger: QueryLogger,
}

impl RequestExecutor {
    pub fn new(
        connection: PooledConnection,
        database: impl Into<String>,
        access_mode: AccessMode,
        mapper: ResultMapper,
        logger: QueryLogger,
    ) -> Self {
        Self {
            connection,
            database: database.into(),
            access_mode,
            mapper,
            logger,
        }
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Id of the pooled connection in use
    pub fn connection_id(&self) -> usize {
        self.connection.id()
    }

    /// Return the `results` array undecoded instead of result sets
    pub fn set_raw_results(&mut self, raw: bool) {
        self.mapper.set_raw(raw);
    }

    pub fn is_raw_results(&self) -> bool {
        self.mapper.is_raw()
    }

    /// Open a server-side transaction and return its id
    pub fn begin_transaction(&mut self) -> Result<TransactionId> {
        let path = self.transactions_path();
        let mode = self.access_mode;

        self.logger
            .instrument(mode, RequestLabel::Begin, &[], || {
                let response = self.connection.post(
                    &path,
                    &json!({ "statements": [] }),
                    &[(ACCESS_MODE_HEADER, mode.as_str())],
                )?;

                if !response.is_success() {
                    return Err(Error::TransactionBegin(response.body));
                }

                match response.location.as_deref().and_then(transaction_id_from_location) {
                    Some(id) => {
                        log::debug!("Began {} transaction {} on {}", mode, id, self.database);
                        Ok(id)
                    }
                    None => Err(Error::TransactionBegin(response.body)),
                }
            })
    }

    /// Run statements inside an open transaction
    pub fn run_statements(&mut self, id: TransactionId, statements: &[Statement]) -> Result<Results> {
        require_statements(statements)?;
        let path = self.transaction_path(id);
        self.post_statements(RequestLabel::Transaction(id), &path, statements, Some(id))
    }

    /// Begin, run and commit in a single request
    pub fn one_shot_transaction(&mut self, statements: &[Statement]) -> Result<Results> {
        require_statements(statements)?;
        let path = format!("{}/commit", self.transactions_path());
        self.post_statements(RequestLabel::OneShot, &path, statements, None)
    }

    /// Commit, optionally running final statements first
    pub fn commit_transaction(&mut self, id: TransactionId, statements: &[Statement]) -> Result<Results> {
        let path = format!("{}/commit", self.transaction_path(id));
        self.post_statements(RequestLabel::Transaction(id), &path, statements, Some(id))
    }

    pub fn rollback_transaction(&mut self, id: TransactionId) -> Result<Results> {
        let path = self.transaction_path(id);
        let mode = self.access_mode;

        self.logger
            .instrument(mode, RequestLabel::Transaction(id), &[], || {
                let response = self.connection.delete(&path)?;
                self.handle_transaction(response, Some(id))
            })
    }

    fn post_statements(
        &self,
        label: RequestLabel,
        path: &str,
        statements: &[Statement],
        id: Option<TransactionId>,
    ) -> Result<Results> {
        self.logger
            .instrument(self.access_mode, label, statements, || {
                let response = self.connection.post(
                    path,
                    &statements_payload(statements),
                    &[(ACCESS_MODE_HEADER, self.access_mode.as_str())],
                )?;
                self.handle_transaction(response, id)
            })
    }

    /// Common status handling for every transactional response
    fn handle_transaction(&self, response: HttpResponse, id: Option<TransactionId>) -> Result<Results> {
        if response.status == 404 {
            if let Some(id) = id {
                return Err(Error::TransactionNotFound(id));
            }
        }

        if !response.is_success() {
            let error = ResponseError::new(None, response.body)
                .with_response(response.status, response.url);
            return Err(Error::TransactionRollback(vec![error]));
        }

        self.mapper.parse(&response)
    }

    fn transactions_path(&self) -> String {
        format!("/db/{}/tx", self.database)
    }

    fn transaction_path(&self, id: TransactionId) -> String {
        format!("{}/{}", self.transactions_path(), id)
    }
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("connection", &self.connection.id())
            .field("database", &self.database)
            .field("access_mode", &self.access_mode)
            .field("mapper", &self.mapper)
            .finish()
    }
}

fn require_statements(statements: &[Statement]) -> Result<()> {
    if statements.is_empty() {
        return Err(Error::InvalidArgument(
            "at least one statement is required".to_string(),
        ));
    }
    Ok(())
}

/// Positive integer in the trailing path segment of a `Location` header
pub fn transaction_id_from_location(location: &str) -> Option<TransactionId> {
    let segment = location.trim_end_matches('/').rsplit('/').next()?;
    match segment.parse::<TransactionId>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_trailing_transaction_id() {
        assert_eq!(
            transaction_id_from_location("http://localhost:7474/db/neo4j/tx/42"),
            Some(42)
        );
        assert_eq!(transaction_id_from_location("/db/neo4j/tx/7/"), Some(7));
    }

    #[test]
    fn should_reject_non_positive_or_non_numeric_ids() {
        assert_eq!(transaction_id_from_location("http://localhost:7474/db/neo4j/tx/abc"), None);
        assert_eq!(transaction_id_from_location("http://localhost:7474/db/neo4j/tx/0"), None);
        assert_eq!(transaction_id_from_location("http://localhost:7474/db/neo4j/tx/-3"), None);
        assert_eq!(transaction_id_from_location(""), None);
    }

    #[test]
    fn should_parse_access_modes() {
        assert_eq!("read".parse::<AccessMode>(), Ok(AccessMode::Read));
        assert_eq!("WRITE".parse::<AccessMode>(), Ok(AccessMode::Write));
        assert!("sideways".parse::<AccessMode>().is_err());
        assert_eq!(AccessMode::default().to_string(), "WRITE");
    }
}
