// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Client-side transaction states

use std::fmt;

/// Lifecycle of a [`super::Transaction`]
///
/// `NotStarted -> Open -> Closed`, and `Cleaned` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Created, `begin` not yet called
    NotStarted,
    /// Accepted by the server, statements may run
    Open,
    /// Committed, rolled back or discarded by the server
    Closed,
    /// Executor released; the transaction can no longer be used
    Cleaned,
}

impl TransactionState {
    pub fn is_open(self) -> bool {
        self == TransactionState::Open
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Closed | TransactionState::Cleaned)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::NotStarted => "not started",
            TransactionState::Open => "open",
            TransactionState::Closed => "closed",
            TransactionState::Cleaned => "cleaned",
        };
        f.write_str(name)
    }
}
