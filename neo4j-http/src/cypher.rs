// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cypher literal formatting
//!
//! Renders parameter values as Cypher literals. The query log uses
//! [`resolve`] to print statements with their parameters substituted; the
//! output is meant for humans and is never sent to the server.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::statement::Statement;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid placeholder regex"));

static PLAIN_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Quote a string as a single-quoted Cypher literal
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Quote a label, relationship type or property key when needed
pub fn escape_identifier(name: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Render a JSON value as a Cypher literal
pub fn to_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", escape_identifier(k), to_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Statement text with every known `$name` placeholder replaced by its literal
pub fn resolve(statement: &Statement) -> String {
    let parameters = statement.parameters();
    if parameters.is_empty() {
        return statement.text().to_string();
    }

    PLACEHOLDER
        .replace_all(statement.text(), |caps: &Captures| {
            match parameters.get(&caps[1]) {
                Some(value) => to_literal(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
