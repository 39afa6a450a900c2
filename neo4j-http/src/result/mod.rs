// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result model and response mapping
//!
//! Every transactional call returns [`Results`]: one entry per submitted
//! statement, either mapped into [`ResultSet`]s or, in raw mode, the decoded
//! `results` array elements as they came from the server.

pub mod graph;
pub mod mapper;
pub mod set;

pub use graph::{GraphFragment, GraphNode, GraphRelationship};
pub use mapper::{ResponseHook, ResultMapper};
pub use set::{Columns, ResultRow, ResultSet};

use serde_json::Value;

/// Per-statement results of one request
#[derive(Debug, Clone, PartialEq)]
pub enum Results {
    Mapped(Vec<ResultSet>),
    Raw(Vec<Value>),
}

impl Results {
    /// No results, mapped form
    pub fn empty() -> Self {
        Results::Mapped(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            Results::Mapped(sets) => sets.len(),
            Results::Raw(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Results::Raw(_))
    }

    pub fn mapped(&self) -> Option<&[ResultSet]> {
        match self {
            Results::Mapped(sets) => Some(sets),
            Results::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&[Value]> {
        match self {
            Results::Raw(values) => Some(values),
            Results::Mapped(_) => None,
        }
    }

    pub fn into_mapped(self) -> Option<Vec<ResultSet>> {
        match self {
            Results::Mapped(sets) => Some(sets),
            Results::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<Vec<Value>> {
        match self {
            Results::Raw(values) => Some(values),
            Results::Mapped(_) => None,
        }
    }

    /// First mapped result set
    pub fn first(&self) -> Option<&ResultSet> {
        self.mapped()?.first()
    }

    /// Mapped result set of the statement at `index`
    pub fn get(&self, index: usize) -> Option<&ResultSet> {
        self.mapped()?.get(index)
    }

    /// First value of the first row of the first result set
    pub fn single_value(&self) -> Option<&Value> {
        self.first()?.first()?.value(0)
    }
}

impl Default for Results {
    fn default() -> Self {
        Results::empty()
    }
}
