// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-statement result sets and rows

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::ops::Index;
use std::sync::Arc;

use super::graph::GraphFragment;

/// Column names shared by a result set and its rows
pub type Columns = Arc<[String]>;

/// Result of one statement: columns, rows, optional statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Columns,
    rows: Vec<ResultRow>,
    stats: Option<Map<String, Value>>,
}

impl ResultSet {
    pub(crate) fn new(columns: Columns, rows: Vec<ResultRow>, stats: Option<Map<String, Value>>) -> Self {
        Self {
            columns,
            rows,
            stats,
        }
    }

    /// Column names in server order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&ResultRow> {
        self.rows.first()
    }

    /// Every row's value for one column
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row.values[index]).collect())
    }

    /// Query statistics, present when the statement asked for them
    pub fn stats(&self) -> Option<&Map<String, Value>> {
        self.stats.as_ref()
    }

    /// Numeric statistic such as `nodes_created`
    pub fn stat(&self, name: &str) -> Option<i64> {
        self.stats.as_ref()?.get(name)?.as_i64()
    }

    /// Whether the statement changed the graph, per its statistics
    pub fn contains_updates(&self) -> Option<bool> {
        self.stats.as_ref()?.get("contains_updates")?.as_bool()
    }
}

impl Index<usize> for ResultSet {
    type Output = ResultRow;

    fn index(&self, index: usize) -> &ResultRow {
        &self.rows[index]
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One row: positional values with per-value metadata
///
/// Holds the parent's column list so values can be looked up by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Columns,
    values: Vec<Value>,
    meta: Vec<Value>,
    graph: Option<GraphFragment>,
}

impl ResultRow {
    pub(crate) fn new(columns: Columns, values: Vec<Value>, meta: Vec<Value>, graph: Option<GraphFragment>) -> Self {
        Self {
            columns,
            values,
            meta,
            graph,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Entity metadata (id, type, deleted) aligned with `values`; `null` for plain values
    pub fn meta(&self) -> &[Value] {
        &self.meta
    }

    pub fn graph(&self) -> Option<&GraphFragment> {
        self.graph.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column position
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values.get(index)
    }

    /// Deserialise one value by column name
    pub fn get_as<T: DeserializeOwned>(&self, column: &str) -> Option<Result<T, serde_json::Error>> {
        self.get(column).map(|v| serde_json::from_value(v.clone()))
    }

    /// `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Column name to value map
    pub fn to_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }
}

impl Index<usize> for ResultRow {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl Index<&str> for ResultRow {
    type Output = Value;

    /// Missing columns index to `Value::Null`, like `serde_json::Value`
    fn index(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(column).unwrap_or(&NULL)
    }
}
