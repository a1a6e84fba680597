// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schemaless records shared by the OData feeds and the activity pipeline.

use serde_json::Value;

/// One row: an ordered mapping from field name to a JSON scalar.
///
/// Key order is preserved (`serde_json` is built with `preserve_order`).
pub type Record = serde_json::Map<String, Value>;

/// Text form of a scalar as the feeds compare it.
///
/// Booleans render as `True`/`False` and numbers keep their JSON spelling.
/// Null yields `None` so that absent and null fields behave the same.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
