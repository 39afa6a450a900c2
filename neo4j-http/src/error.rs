// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the neo4j-http client

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::transaction::TransactionId;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (connect, send, receive, pool checkout)
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// A single error reported by the server outside a transaction
    #[error("Response error: {0}")]
    Response(ResponseError),

    /// The server rolled the transaction back; it is closed server-side
    #[error("Transaction rolled back: {}", join_messages(.0))]
    TransactionRollback(Vec<ResponseError>),

    /// The transaction no longer exists on the server (usually expired)
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// The server did not accept a begin request
    #[error("Failed to begin transaction: {0}")]
    TransactionBegin(String),

    /// Client-side misuse of the transaction state machine
    #[error("Transaction in bad state: {0}")]
    TransactionInBadState(String),

    /// Response body could not be decoded or has an unexpected shape
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Errors absorbed by the tolerant call variants.
    ///
    /// Caller mistakes (`InvalidArgument`, `Configuration`) are never part
    /// of this family.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Request(_)
                | Error::Response(_)
                | Error::TransactionRollback(_)
                | Error::TransactionNotFound(_)
                | Error::TransactionBegin(_)
                | Error::TransactionInBadState(_)
                | Error::InvalidJson(_)
        )
    }

    /// True when the server has already discarded the transaction
    pub fn closes_transaction(&self) -> bool {
        matches!(
            self,
            Error::TransactionRollback(_) | Error::TransactionNotFound(_)
        )
    }

    /// Server-reported errors carried by this error, if any
    pub fn response_errors(&self) -> &[ResponseError] {
        match self {
            Error::TransactionRollback(errors) => errors,
            Error::Response(error) => std::slice::from_ref(error),
            _ => &[],
        }
    }

    pub(crate) fn bad_state(message: impl Into<String>) -> Self {
        Error::TransactionInBadState(message.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(RequestError::Transport(e))
    }
}

/// Transport-level failures
#[derive(Error, Debug)]
pub enum RequestError {
    /// HTTP client failure, including request timeouts
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// No pooled connection became available in time
    #[error("Timed out after {0:?} waiting for a pooled connection")]
    PoolExhausted(Duration),

    /// The pool has been shut down
    #[error("Connection pool is shut down")]
    PoolClosed,

    /// The readiness probe gave up
    #[error("Server at {url} not ready after {waited:?}: {reason}")]
    ServerUnavailable {
        url: String,
        waited: Duration,
        reason: String,
    },
}

/// One error entry reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    /// Server status code, e.g. `Neo.ClientError.Statement.SyntaxError`.
    /// Absent when the error was derived from an HTTP status.
    pub code: Option<String>,
    pub message: String,
    /// HTTP status of the originating response
    pub status: Option<u16>,
    /// URL of the originating response
    pub url: Option<String>,
}

impl ResponseError {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            url: None,
        }
    }

    /// Tag the error with the HTTP response it came from
    pub fn with_response(mut self, status: u16, url: impl Into<String>) -> Self {
        self.status = Some(status);
        self.url = Some(url.into());
        self
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => match self.status {
                Some(status) => write!(f, "HTTP {}: {}", status, self.message),
                None => write!(f, "{}", self.message),
            },
        }
    }
}

impl std::error::Error for ResponseError {}

fn join_messages(errors: &[ResponseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_recoverable_errors() {
        assert!(Error::TransactionBegin("x".into()).is_recoverable());
        assert!(Error::bad_state("closed").is_recoverable());
        assert!(Error::Request(RequestError::PoolClosed).is_recoverable());
        assert!(!Error::InvalidArgument("empty".into()).is_recoverable());
        assert!(!Error::Configuration("bad uri".into()).is_recoverable());
    }

    #[test]
    fn should_join_rollback_messages() {
        let error = Error::TransactionRollback(vec![
            ResponseError::new(Some("Neo.ClientError.Statement.SyntaxError".into()), "bad"),
            ResponseError::new(None, "boom").with_response(500, "http://db/tx/1"),
        ]);

        assert_eq!(
            error.to_string(),
            "Transaction rolled back: Neo.ClientError.Statement.SyntaxError: bad; HTTP 500: boom"
        );
        assert_eq!(error.response_errors().len(), 2);
        assert!(error.closes_transaction());
    }
}
