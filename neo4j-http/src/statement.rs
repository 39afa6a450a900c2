// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement encoding
//!
//! Turns a query text plus parameter map into the statement payload of the
//! transactional endpoint:
//!
//! ```text
//! {"statement": "...", "parameters": {...}, "includeStats": true, "resultDataContents": ["row", "graph"]}
//! ```
//!
//! Two parameter keys are reserved as control flags and never sent to the
//! server: [`WITH_STATS`] and [`RESULT_AS_GRAPH`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value};

/// Reserved key requesting query statistics
pub const WITH_STATS: &str = "with_stats";
/// Reserved key requesting graph-format results
pub const RESULT_AS_GRAPH: &str = "result_as_graph";

/// Ordered parameter map
pub type Parameters = Map<String, Value>;

/// One statement ready to be sent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    text: String,
    parameters: Parameters,
    include_stats: bool,
    result_as_graph: bool,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Add one parameter. Reserved keys toggle the matching flag instead.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            WITH_STATS => self.include_stats = is_set(&value),
            RESULT_AS_GRAPH => self.result_as_graph = is_set(&value),
            _ => {
                self.parameters.insert(key, value);
            }
        }
        self
    }

    /// Merge a parameter map, extracting the reserved keys
    pub fn with_parameters(self, parameters: Parameters) -> Self {
        parameters
            .into_iter()
            .fold(self, |statement, (key, value)| statement.param(key, value))
    }

    pub fn with_stats(mut self, include: bool) -> Self {
        self.include_stats = include;
        self
    }

    pub fn result_as_graph(mut self, as_graph: bool) -> Self {
        self.result_as_graph = as_graph;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn includes_stats(&self) -> bool {
        self.include_stats
    }

    pub fn is_result_as_graph(&self) -> bool {
        self.result_as_graph
    }

    /// Wire representation of this statement
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut len = 2;
        if self.include_stats {
            len += 1;
        }
        if self.result_as_graph {
            len += 1;
        }

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("statement", &self.text)?;
        map.serialize_entry("parameters", &self.parameters)?;
        if self.include_stats {
            map.serialize_entry("includeStats", &true)?;
        }
        if self.result_as_graph {
            map.serialize_entry("resultDataContents", &["row", "graph"])?;
        }
        map.end()
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::new(text)
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::new(text)
    }
}

impl From<(&str, Parameters)> for Statement {
    fn from((text, parameters): (&str, Parameters)) -> Self {
        encode(text, parameters)
    }
}

/// Encode a query text and its parameters into a [`Statement`]
pub fn encode(text: impl Into<String>, parameters: Parameters) -> Statement {
    Statement::new(text).with_parameters(parameters)
}

/// Encode every `(text, parameters)` pair, preserving order
pub fn encode_batch<I, T>(statements: I) -> Vec<Statement>
where
    I: IntoIterator<Item = (T, Parameters)>,
    T: Into<String>,
{
    statements
        .into_iter()
        .map(|(text, parameters)| encode(text, parameters))
        .collect()
}

/// Request body for a list of statements
pub fn statements_payload(statements: &[Statement]) -> Value {
    json!({ "statements": statements })
}

// A control flag is set unless it is null or false.
fn is_set(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}
