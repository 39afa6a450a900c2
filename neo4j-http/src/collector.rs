// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement accumulation for one-shot transactions

use crate::statement::{encode, Parameters, Statement};

/// Append-only list of statements sent later as a single one-shot request
#[derive(Debug, Clone, Default)]
pub struct StatementCollector {
    statements: Vec<Statement>,
}

impl StatementCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and append a statement
    pub fn add(&mut self, text: &str, parameters: Parameters) -> &mut Self {
        self.statements.push(encode(text, parameters));
        self
    }

    pub fn add_statement(&mut self, statement: impl Into<Statement>) -> &mut Self {
        self.statements.push(statement.into());
        self
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}
