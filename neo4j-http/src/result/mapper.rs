// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Response body to result mapping
//!
//! Handles the response shape of the transactional endpoint:
//!
//! ```text
//! {"results": [{"columns": [...], "data": [{"row": [...], "meta": [...], "graph": {...}}], "stats": {...}}],
//!  "errors": [{"code": "...", "message": "..."}]}
//! ```

use serde_json::{Map, Value};
use std::sync::Arc;

use super::graph::GraphFragment;
use super::set::{Columns, ResultRow, ResultSet};
use super::Results;
use crate::error::{Error, ResponseError, Result};
use crate::pool::HttpResponse;

/// Rewrites a raw response body before it is decoded.
///
/// Must return text that is still valid JSON.
pub type ResponseHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Decodes response bodies into [`Results`]
#[derive(Clone, Default)]
pub struct ResultMapper {
    raw: bool,
    hook: Option<ResponseHook>,
}

impl ResultMapper {
    pub fn new(raw: bool, hook: Option<ResponseHook>) -> Self {
        Self { raw, hook }
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn set_raw(&mut self, raw: bool) {
        self.raw = raw;
    }

    pub fn parse(&self, response: &HttpResponse) -> Result<Results> {
        let document = self.decode(&response.body)?;

        if let Some(errors) = document.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let errors = errors
                    .iter()
                    .map(|e| response_error(e).with_response(response.status, response.url.clone()))
                    .collect();
                return Err(Error::TransactionRollback(errors));
            }
        }

        let results = match document.get("results") {
            None | Some(Value::Null) => return Ok(self.empty()),
            Some(Value::Array(results)) => results,
            Some(other) => {
                return Err(Error::InvalidJson(format!(
                    "expected 'results' to be an array, got {}",
                    kind(other)
                )))
            }
        };

        if self.raw {
            return Ok(Results::Raw(results.clone()));
        }

        results
            .iter()
            .map(map_result_set)
            .collect::<Result<Vec<_>>>()
            .map(Results::Mapped)
    }

    fn decode(&self, body: &str) -> Result<Map<String, Value>> {
        let rewritten;
        let body = match &self.hook {
            Some(hook) => {
                rewritten = hook(body);
                rewritten.as_str()
            }
            None => body,
        };

        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(Error::InvalidJson(format!(
                "expected a JSON object, got {}",
                kind(&other)
            ))),
            Err(e) => Err(Error::InvalidJson(e.to_string())),
        }
    }

    fn empty(&self) -> Results {
        if self.raw {
            Results::Raw(Vec::new())
        } else {
            Results::Mapped(Vec::new())
        }
    }
}

impl std::fmt::Debug for ResultMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultMapper")
            .field("raw", &self.raw)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

fn response_error(entry: &Value) -> ResponseError {
    let code = entry.get("code").and_then(Value::as_str).map(str::to_string);
    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    ResponseError::new(code, message)
}

fn map_result_set(result: &Value) -> Result<ResultSet> {
    let columns: Columns = match result.get("columns") {
        Some(Value::Array(columns)) => columns
            .iter()
            .map(|c| match c {
                Value::String(name) => Ok(name.clone()),
                other => Err(Error::InvalidJson(format!(
                    "column name must be a string, got {}",
                    kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?
            .into(),
        None => Arc::from(Vec::new()),
        Some(other) => {
            return Err(Error::InvalidJson(format!(
                "expected 'columns' to be an array, got {}",
                kind(other)
            )))
        }
    };

    let rows = match result.get("data") {
        Some(Value::Array(data)) => data
            .iter()
            .map(|entry| map_row(&columns, entry))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
        Some(other) => {
            return Err(Error::InvalidJson(format!(
                "expected 'data' to be an array, got {}",
                kind(other)
            )))
        }
    };

    let stats = result.get("stats").and_then(Value::as_object).cloned();

    Ok(ResultSet::new(columns, rows, stats))
}

fn map_row(columns: &Columns, entry: &Value) -> Result<ResultRow> {
    let values = entry
        .get("row")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if values.len() != columns.len() {
        return Err(Error::InvalidJson(format!(
            "row has {} values for {} columns",
            values.len(),
            columns.len()
        )));
    }

    let mut meta = entry
        .get("meta")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    meta.resize(columns.len(), Value::Null);

    let graph = match entry.get("graph") {
        Some(Value::Null) | None => None,
        Some(graph) => Some(
            serde_json::from_value::<GraphFragment>(graph.clone())
                .map_err(|e| Error::InvalidJson(format!("invalid graph entry: {}", e)))?,
        ),
    };

    Ok(ResultRow::new(Arc::clone(columns), values, meta, graph))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
