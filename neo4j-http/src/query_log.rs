// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Request instrumentation
//!
//! When enabled, each transactional request is timed and logged under the
//! `neo4j_http::query` target with its access mode, transaction label,
//! sequence number and the statements with parameters substituted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::QueryLogLevel;
use crate::cypher;
use crate::error::Result;
use crate::executor::AccessMode;
use crate::statement::Statement;
use crate::transaction::TransactionId;

pub const LOG_TARGET: &str = "neo4j_http::query";

/// Which request is being logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLabel {
    Begin,
    Transaction(TransactionId),
    OneShot,
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestLabel::Begin => write!(f, "begin"),
            RequestLabel::Transaction(id) => write!(f, "tx:{}", id),
            RequestLabel::OneShot => write!(f, "one-shot"),
        }
    }
}

/// Times and logs requests; a no-op when the level is `Off`
#[derive(Debug, Clone)]
pub struct QueryLogger {
    level: QueryLogLevel,
    counter: Arc<AtomicU64>,
}

impl QueryLogger {
    /// `counter` is shared by every logger of one client
    pub fn new(level: QueryLogLevel, counter: Arc<AtomicU64>) -> Self {
        Self { level, counter }
    }

    pub fn disabled() -> Self {
        Self::new(QueryLogLevel::Off, Arc::new(AtomicU64::new(0)))
    }

    pub fn level(&self) -> QueryLogLevel {
        self.level
    }

    /// Number of requests logged so far through the shared counter
    pub fn requests_logged(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn instrument<T>(
        &self,
        mode: AccessMode,
        label: RequestLabel,
        statements: &[Statement],
        request: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if self.level == QueryLogLevel::Off {
            return request();
        }

        let started = Instant::now();
        let result = request();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let outcome = if result.is_ok() { "ok" } else { "failed" };

        log::info!(
            target: LOG_TARGET,
            "[{}] {} #{} {} ({:.1}ms){}",
            mode,
            label,
            sequence,
            outcome,
            elapsed_ms,
            format_statements(statements)
        );

        if self.level == QueryLogLevel::Debug {
            for (index, statement) in statements.iter().enumerate() {
                log::debug!(
                    target: LOG_TARGET,
                    "#{} statement {} parameters: {}",
                    sequence,
                    index,
                    serde_json::Value::Object(statement.parameters().clone())
                );
            }
        }

        result
    }
}

fn format_statements(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| format!("\n  {}", cypher::resolve(s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn should_not_count_when_disabled() {
        let logger = QueryLogger::disabled();
        let value = logger
            .instrument(AccessMode::Read, RequestLabel::OneShot, &[], || Ok(5))
            .expect("request result");

        assert_eq!(value, 5);
        assert_eq!(logger.requests_logged(), 0);
    }

    #[test]
    fn should_count_and_pass_through_results() {
        let counter = Arc::new(AtomicU64::new(0));
        let logger = QueryLogger::new(QueryLogLevel::Debug, Arc::clone(&counter));
        let statements = [Statement::new("RETURN $x").param("x", 1)];

        let ok = logger.instrument(AccessMode::Write, RequestLabel::Transaction(3), &statements, || Ok("done"));
        let failed: Result<()> = logger.instrument(AccessMode::Write, RequestLabel::Begin, &[], || {
            Err(Error::TransactionBegin("nope".into()))
        });

        assert_eq!(ok.expect("request result"), "done");
        assert!(matches!(failed, Err(Error::TransactionBegin(_))));
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn should_label_requests() {
        assert_eq!(RequestLabel::Transaction(12).to_string(), "tx:12");
        assert_eq!(RequestLabel::OneShot.to_string(), "one-shot");
        assert_eq!(
            format_statements(&[Statement::new("RETURN $x").param("x", "a")]),
            "\n  RETURN 'a'"
        );
    }
}
