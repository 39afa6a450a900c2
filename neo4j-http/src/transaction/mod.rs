// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Explicit transactions
//!
//! A [`Transaction`] wraps a [`RequestExecutor`] and the server-assigned id
//! and enforces the call order `begin -> run* -> commit | rollback`.
//! Misuse is rejected with `TransactionInBadState` before any request is
//! made.
//!
//! Every mutating call comes in two forms:
//! - strict (`begin`, `run`, `commit`, ...) propagates every error;
//! - tolerant (`begin_quietly`, `run_quietly`, ...) absorbs recoverable
//!   errors, closes and cleans the transaction, and returns `None`.

mod state;

pub use state::TransactionState;

use crate::error::{Error, Result};
use crate::executor::{AccessMode, RequestExecutor};
use crate::result::Results;
use crate::statement::{encode, Parameters, Statement};

/// Server-assigned transaction id (trailing segment of the `Location` header)
pub type TransactionId = u64;

#[derive(Debug)]
pub struct Transaction {
    id: Option<TransactionId>,
    state: TransactionState,
    access_mode: AccessMode,
    executor: Option<RequestExecutor>,
}

impl Transaction {
    /// A transaction in `NotStarted` state bound to `executor`
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            id: None,
            state: TransactionState::NotStarted,
            access_mode: executor.access_mode(),
            executor: Some(executor),
        }
    }

    pub fn id(&self) -> Option<TransactionId> {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Toggle raw results for subsequent calls
    pub fn set_raw_results(&mut self, raw: bool) {
        if let Some(executor) = self.executor.as_mut() {
            executor.set_raw_results(raw);
        }
    }

    pub fn begin(&mut self) -> Result<TransactionId> {
        if self.state != TransactionState::NotStarted {
            return Err(Error::bad_state(format!(
                "cannot begin: transaction is {}",
                self.state
            )));
        }

        let executor = self.executor_mut("begin")?;
        match executor.begin_transaction() {
            Ok(id) => {
                log::debug!(
                    "Transaction {} open on connection {}",
                    id,
                    executor.connection_id()
                );
                self.id = Some(id);
                self.state = TransactionState::Open;
                Ok(id)
            }
            Err(e) => {
                self.state = TransactionState::Closed;
                Err(e)
            }
        }
    }

    /// Run one statement
    pub fn run(&mut self, statement: impl Into<Statement>) -> Result<Results> {
        self.run_batch(&[statement.into()])
    }

    /// Run one statement given as text and parameters
    pub fn run_query(&mut self, text: &str, parameters: Parameters) -> Result<Results> {
        self.run_batch(&[encode(text, parameters)])
    }

    /// Run statements in order within a single request
    pub fn run_batch(&mut self, statements: &[Statement]) -> Result<Results> {
        let id = self.require_open("run")?;
        let result = self.executor_mut("run")?.run_statements(id, statements);

        if let Err(e) = &result {
            if e.closes_transaction() {
                log::debug!("Transaction {} closed by server: {}", id, e);
                self.state = TransactionState::Closed;
            }
        }
        result
    }

    /// Commit, running `statements` first if any are given
    pub fn commit(&mut self, statements: &[Statement]) -> Result<Results> {
        let id = self.require_open("commit")?;
        let result = self.executor_mut("commit")?.commit_transaction(id, statements);
        self.state = TransactionState::Closed;
        result
    }

    pub fn rollback(&mut self) -> Result<Results> {
        let id = self.require_open("rollback")?;
        let result = self.executor_mut("rollback")?.rollback_transaction(id);
        self.state = TransactionState::Closed;
        result
    }

    /// Release the executor (and its connection). Never fails; idempotent.
    pub fn cleanup(&mut self) {
        if self.executor.take().is_some() {
            log::debug!(
                "Cleaned up transaction {} ({})",
                self.label(),
                self.state
            );
        }
        self.state = TransactionState::Cleaned;
    }

    /// Run `operation`; a recoverable error closes and cleans the
    /// transaction and is replaced by `fallback(error)`. Other errors
    /// propagate unchanged.
    pub fn tolerate<T>(
        &mut self,
        operation: impl FnOnce(&mut Self) -> Result<T>,
        fallback: impl FnOnce(Error) -> T,
    ) -> Result<T> {
        match operation(self) {
            Ok(value) => Ok(value),
            Err(e) if e.is_recoverable() => {
                log::warn!("Transaction {} abandoned: {}", self.label(), e);
                if self.state != TransactionState::Cleaned {
                    self.state = TransactionState::Closed;
                    self.cleanup();
                }
                Ok(fallback(e))
            }
            Err(e) => Err(e),
        }
    }

    pub fn begin_quietly(&mut self) -> Result<Option<TransactionId>> {
        self.tolerate(|tx| tx.begin().map(Some), |_| None)
    }

    pub fn run_quietly(&mut self, statement: impl Into<Statement>) -> Result<Option<Results>> {
        let statement = statement.into();
        self.tolerate(|tx| tx.run_batch(&[statement]).map(Some), |_| None)
    }

    pub fn run_batch_quietly(&mut self, statements: &[Statement]) -> Result<Option<Results>> {
        self.tolerate(|tx| tx.run_batch(statements).map(Some), |_| None)
    }

    pub fn commit_quietly(&mut self, statements: &[Statement]) -> Result<Option<Results>> {
        self.tolerate(|tx| tx.commit(statements).map(Some), |_| None)
    }

    pub fn rollback_quietly(&mut self) -> Result<Option<Results>> {
        self.tolerate(|tx| tx.rollback().map(Some), |_| None)
    }

    fn require_open(&self, action: &str) -> Result<TransactionId> {
        match (self.state, self.id) {
            (TransactionState::Open, Some(id)) => Ok(id),
            (state, _) => Err(Error::bad_state(format!(
                "cannot {}: transaction is {}",
                action, state
            ))),
        }
    }

    fn executor_mut(&mut self, action: &str) -> Result<&mut RequestExecutor> {
        self.executor.as_mut().ok_or_else(|| {
            Error::bad_state(format!("cannot {}: transaction has been cleaned up", action))
        })
    }

    fn label(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => "(unstarted)".to_string(),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let (TransactionState::Open, Some(id), Some(executor)) =
            (self.state, self.id, self.executor.as_mut())
        {
            log::debug!("Transaction {} dropped while open, rolling back", id);
            if let Err(e) = executor.rollback_transaction(id) {
                log::debug!("Rollback of dropped transaction {} failed: {}", id, e);
            }
        }
    }
}
