// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for terminal output

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use neo4j_http::{ResultSet, Results};
use serde_json::Value;

use super::commands::OutputFormat;

pub struct ResultFormatter;

impl ResultFormatter {
    /// Render every result set in `format`; raw results are always JSON
    pub fn format(results: &Results, format: OutputFormat) -> String {
        let sets = match results {
            Results::Raw(values) => return pretty_json(&Value::Array(values.clone())),
            Results::Mapped(sets) => sets,
        };

        if sets.is_empty() {
            return "No results".to_string();
        }

        match format {
            OutputFormat::Table => sets
                .iter()
                .map(format_table)
                .collect::<Vec<_>>()
                .join("\n\n"),
            OutputFormat::Json => format_json(sets),
            OutputFormat::Csv => sets
                .iter()
                .map(format_csv)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Non-zero statistics of each set, one `name: value` per line
    pub fn format_stats(results: &Results) -> Option<String> {
        let lines: Vec<String> = results
            .mapped()?
            .iter()
            .filter_map(ResultSet::stats)
            .flat_map(|stats| {
                stats.iter().filter_map(|(name, value)| match value {
                    Value::Number(n) if n.as_i64() != Some(0) => Some(format!("{}: {}", name, n)),
                    _ => None,
                })
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn format_table(set: &ResultSet) -> String {
    if set.columns().is_empty() {
        return "(no columns)".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(set.columns().iter().map(Cell::new));

    for row in set {
        table.add_row(row.values().iter().map(|v| Cell::new(display_value(v))));
    }

    let count = set.len();
    format!(
        "{}\n{} row{}",
        table,
        count,
        if count == 1 { "" } else { "s" }
    )
}

fn format_json(sets: &[ResultSet]) -> String {
    let rendered: Vec<Value> = sets
        .iter()
        .map(|set| Value::Array(set.iter().map(|row| Value::Object(row.to_map())).collect()))
        .collect();

    if rendered.len() == 1 {
        pretty_json(&rendered[0])
    } else {
        pretty_json(&Value::Array(rendered))
    }
}

fn format_csv(set: &ResultSet) -> String {
    let mut lines = Vec::with_capacity(set.len() + 1);
    lines.push(
        set.columns()
            .iter()
            .map(|c| csv_field(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in set {
        lines.push(
            row.values()
                .iter()
                .map(|v| csv_field(&display_value(v)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Strings print bare, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
