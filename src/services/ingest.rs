// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shaping raw activity listings into table rows, and the column report
//! used when designing the ingest table.

use crate::models::Record;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write;

/// Columns with at most this many distinct values have them listed.
const MAX_LISTED_UNIQUE: usize = 20;

const RULE: &str = "================================================================================";

/// Raw activities ready for insertion.
#[derive(Debug, Default)]
pub struct IngestBatch {
    /// Union of field names, in first-seen order
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl IngestBatch {
    /// Store nested objects and arrays as JSON text and collect the column
    /// set across all activities.
    pub fn from_activities(activities: Vec<Record>) -> Self {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();

        let rows = activities
            .into_iter()
            .map(|activity| {
                activity
                    .into_iter()
                    .map(|(key, value)| {
                        if seen.insert(key.clone()) {
                            columns.push(key.clone());
                        }
                        (key, encode_nested(value))
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Human-readable summary of the batch: shape, then one section per
    /// column with its inferred type, null counts, a sample and distinct
    /// values.
    pub fn schema_report(&self) -> String {
        let mut out = String::new();
        let total = self.rows.len();

        let _ = writeln!(out, "{RULE}\nDATA STRUCTURE ANALYSIS\n{RULE}\n");
        let _ = writeln!(out, "Shape: ({}, {})", total, self.columns.len());
        let _ = writeln!(out, "Total Rows: {}", total);
        let _ = writeln!(out, "Total Columns: {}\n", self.columns.len());

        let _ = writeln!(out, "{RULE}\nCOLUMN DATA TYPES\n{RULE}");
        let width = self.columns.iter().map(String::len).max().unwrap_or(0);
        for column in &self.columns {
            let _ = writeln!(
                out,
                "{:<width$}  {}",
                column,
                self.column_values(column).inferred_type()
            );
        }
        out.push('\n');

        let _ = writeln!(out, "{RULE}\nDETAILED COLUMN ANALYSIS\n{RULE}\n");
        if total == 0 {
            return out;
        }

        for column in &self.columns {
            let values = self.column_values(column);
            let nulls = values.null_count();

            let _ = writeln!(out, "\n{RULE}\nColumn: {column}\n{RULE}");
            let _ = writeln!(out, "Inferred Type: {}", values.inferred_type());
            let _ = writeln!(
                out,
                "Null Count: {} ({:.2}%)",
                nulls,
                nulls as f64 / total as f64 * 100.0
            );
            if let Some(max_len) = values.max_string_len() {
                let _ = writeln!(out, "Max Length: {max_len}");
            }
            let _ = writeln!(out, "Sample Value: {}", render(values.0[0]));

            let unique = values.unique();
            let _ = writeln!(out, "Unique Values: {}", unique.len());
            if unique.len() <= MAX_LISTED_UNIQUE {
                let listed: Vec<String> = unique.iter().map(|v| render(v)).collect();
                let _ = writeln!(out, "Unique Values List: [{}]", listed.join(", "));
            }
        }

        out
    }

    fn column_values(&self, column: &str) -> ColumnValues<'_> {
        ColumnValues(
            self.rows
                .iter()
                .map(|row| row.get(column).unwrap_or(&Value::Null))
                .collect(),
        )
    }
}

fn encode_nested(value: Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One column across every row; absent fields read as null.
struct ColumnValues<'a>(Vec<&'a Value>);

impl ColumnValues<'_> {
    fn null_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_null()).count()
    }

    fn inferred_type(&self) -> &'static str {
        let mut kind = "null";
        for value in self.0.iter().filter(|v| !v.is_null()) {
            let this = match value {
                Value::Bool(_) => "boolean",
                Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
                Value::Number(_) => "float",
                _ => "string",
            };
            kind = match (kind, this) {
                ("null", t) => t,
                (a, b) if a == b => a,
                ("integer", "float") | ("float", "integer") => "float",
                _ => "mixed",
            };
        }
        kind
    }

    fn max_string_len(&self) -> Option<usize> {
        self.0
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.chars().count())
            .max()
    }

    /// Distinct non-null values in first-seen order.
    fn unique(&self) -> Vec<&Value> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .copied()
            .filter(|v| !v.is_null())
            .filter(|v| seen.insert(v.to_string()))
            .collect()
    }
}
