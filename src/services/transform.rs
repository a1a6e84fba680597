// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity transform: raw ingested rows to the feed table layout.
//!
//! Each row goes through JSON decoding of the nested columns, unit
//! conversion, exercise-set enrichment and finally projection onto the
//! display columns of [`ACTIVITY_COLUMNS`]. Two placeholder rows anchor the
//! date axis of downstream charts.

use crate::models::activity::{
    EXERCISE_SETS_COLUMN, EXERCISE_SET_COLUMNS, JSON_COLUMNS, PLACEHOLDER_ACTIVITY_TYPE,
    PLACEHOLDER_START_TIMES,
};
use crate::models::{scalar_text, Conversion, Record, ACTIVITY_COLUMNS, KEY_COLUMN};
use crate::time_utils::{format_elapsed, title_case};
use serde_json::{json, Value};
use std::collections::HashSet;

const METERS_TO_MILES: f64 = 0.000621371;
const GRAMS_TO_POUNDS: f64 = 0.00220462;

/// Exercise-set fields not carried into the activity row.
const DROPPED_SET_FIELDS: [&str; 3] = ["category", "subCategory", "duration"];

/// Transform failures. Nothing is written when any of these occur.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("Required source column {0:?} is missing from the ingested data")]
    MissingColumn(&'static str),

    #[error("Duplicate startTimeLocal value {0:?}")]
    DuplicateKey(String),

    #[error("Row {0} has no startTimeLocal value")]
    MissingKey(usize),

    #[error("Column {column} holds a non-numeric value {value:?}")]
    InvalidNumber { column: &'static str, value: String },
}

/// Transform ingested activity rows into feed rows keyed by display name.
pub fn transform_activities(rows: Vec<Record>) -> Result<Vec<Record>, TransformError> {
    check_source_columns(&rows)?;

    let mut out = Vec::with_capacity(rows.len() + PLACEHOLDER_START_TIMES.len());
    for row in rows {
        out.push(transform_row(row)?);
    }
    out.extend(placeholder_rows());

    check_unique_keys(&out)?;

    Ok(out.iter().map(project).collect())
}

fn check_source_columns(rows: &[Record]) -> Result<(), TransformError> {
    if rows.is_empty() {
        return Ok(());
    }

    for column in &ACTIVITY_COLUMNS {
        if EXERCISE_SET_COLUMNS.contains(&column.source) {
            continue;
        }
        if !rows.iter().any(|r| r.contains_key(column.source)) {
            return Err(TransformError::MissingColumn(column.source));
        }
    }
    Ok(())
}

fn check_unique_keys(rows: &[Record]) -> Result<(), TransformError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let key = row
            .get(KEY_COLUMN)
            .and_then(scalar_text)
            .ok_or(TransformError::MissingKey(i))?;
        if !seen.insert(key.clone()) {
            return Err(TransformError::DuplicateKey(key));
        }
    }
    Ok(())
}

fn transform_row(mut row: Record) -> Result<Record, TransformError> {
    decode_json_columns(&mut row);

    for column in &ACTIVITY_COLUMNS {
        let current = row.get(column.source).cloned().unwrap_or(Value::Null);
        let converted = match column.conversion {
            Conversion::None => continue,
            Conversion::ElapsedTime => {
                let seconds = number(&current, column.source)?.unwrap_or(0.0);
                Value::String(format_elapsed(seconds))
            }
            Conversion::MetersToMiles => {
                scale(&current, column.source, |m| m * METERS_TO_MILES)?
            }
            Conversion::CelsiusToFahrenheit => {
                scale(&current, column.source, |c| c * 9.0 / 5.0 + 32.0)?
            }
            Conversion::TypeKeyTitle => match type_key(&current) {
                Some(key) => Value::String(title_case(&key.replace('_', " "))),
                None => Value::Null,
            },
            Conversion::TypeKey => match type_key(&current) {
                Some(key) => Value::String(key.to_string()),
                None => Value::Null,
            },
        };
        row.insert(column.source.to_string(), converted);
    }

    flatten_first_exercise_set(&mut row)?;

    Ok(row)
}

/// Decode JSON-encoded columns in place. Text that does not parse is kept.
fn decode_json_columns(row: &mut Record) {
    for column in JSON_COLUMNS {
        let Some(Value::String(text)) = row.get(column) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(decoded) => {
                row.insert(column.to_string(), decoded);
            }
            Err(e) => {
                tracing::debug!(column, error = %e, "Keeping undecodable JSON column as text");
            }
        }
    }
}

/// Numeric view of a cell; `None` for null.
fn number(value: &Value, column: &'static str) -> Result<Option<f64>, TransformError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| TransformError::InvalidNumber {
                column,
                value: s.clone(),
            }),
        other => Err(TransformError::InvalidNumber {
            column,
            value: other.to_string(),
        }),
    }
}

fn scale(
    value: &Value,
    column: &'static str,
    f: impl Fn(f64) -> f64,
) -> Result<Value, TransformError> {
    Ok(number(value, column)?.map_or(Value::Null, |v| json!(f(v))))
}

fn type_key(value: &Value) -> Option<&str> {
    value.as_object()?.get("typeKey")?.as_str()
}

/// Add `avg_weight_per_rep` to every set, then copy the first set's fields
/// onto the row and convert its volume from grams to whole pounds.
fn flatten_first_exercise_set(row: &mut Record) -> Result<(), TransformError> {
    let mut first: Option<Record> = None;

    if let Some(Value::Array(sets)) = row.get_mut(EXERCISE_SETS_COLUMN) {
        for set in sets.iter_mut() {
            let Value::Object(set) = set else { continue };
            let reps = number(set.get("reps").unwrap_or(&Value::Null), "reps")?.unwrap_or(0.0);
            let volume =
                number(set.get("volume").unwrap_or(&Value::Null), "volume")?.unwrap_or(0.0);
            let avg = if reps > 0.0 {
                json!((volume * GRAMS_TO_POUNDS).ceil() / reps)
            } else {
                json!(0)
            };
            set.insert("avg_weight_per_rep".to_string(), avg);
        }

        first = sets.first().and_then(Value::as_object).cloned();
    }

    if let Some(set) = first {
        for (key, value) in set {
            if !DROPPED_SET_FIELDS.contains(&key.as_str()) {
                row.insert(key, value);
            }
        }
    }

    let grams = number(row.get("volume").unwrap_or(&Value::Null), "volume")?.unwrap_or(0.0);
    row.insert(
        "volume".to_string(),
        json!((grams * GRAMS_TO_POUNDS).ceil() as i64),
    );

    Ok(())
}

fn placeholder_rows() -> impl Iterator<Item = Record> {
    PLACEHOLDER_START_TIMES.iter().map(|start| {
        let mut row = Record::new();
        row.insert(
            "activityType".to_string(),
            Value::String(PLACEHOLDER_ACTIVITY_TYPE.to_string()),
        );
        row.insert(KEY_COLUMN.to_string(), Value::String(start.to_string()));
        row.insert("distance".to_string(), json!(0));
        row
    })
}

/// Keep exactly the schema columns, renamed to display names, in order.
fn project(row: &Record) -> Record {
    ACTIVITY_COLUMNS
        .iter()
        .map(|c| {
            let value = row.get(c.source).cloned().unwrap_or(Value::Null);
            (c.display.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A raw row with every mapped source column present.
    fn raw_row(start: &str) -> Record {
        let mut row = Record::new();
        for column in &ACTIVITY_COLUMNS {
            if !EXERCISE_SET_COLUMNS.contains(&column.source) {
                row.insert(column.source.to_string(), Value::Null);
            }
        }
        row.insert(KEY_COLUMN.to_string(), json!(start));
        row.insert("activityType".to_string(), json!(r#"{"typeKey": "trail_running"}"#));
        row.insert("privacy".to_string(), json!(r#"{"typeKey": "private"}"#));
        row.insert("distance".to_string(), json!(5000.0));
        row.insert("duration".to_string(), json!(3725.0));
        row.insert("minTemperature".to_string(), json!(10.0));
        row
    }

    #[test]
    fn test_transform_converts_units_and_appends_placeholders() {
        let out = transform_activities(vec![raw_row("2025-06-01 08:00:00")]).unwrap();
        assert_eq!(out.len(), 3);

        let row = &out[0];
        assert_eq!(row["Activity Type"], json!("Trail Running"));
        assert_eq!(row["Privacy Setting"], json!("private"));
        assert_eq!(row["Duration (HH:MM:SS.sss)"], json!("1:02:05"));
        assert_eq!(row["Elapsed Duration (H:MM:SS.sss)"], json!("0:00:00"));
        assert_eq!(row["Min Temperature"], json!(50.0));
        assert_eq!(row["Max Temperature"], Value::Null);
        assert_eq!(row["Volume"], json!(0));
        assert_eq!(row["Reps"], Value::Null);

        let miles = row["Distance (miles)"].as_f64().unwrap();
        assert!((miles - 3.106855).abs() < 1e-9);

        let keys: Vec<_> = row.keys().cloned().collect();
        let expected: Vec<_> = ACTIVITY_COLUMNS.iter().map(|c| c.display.to_string()).collect();
        assert_eq!(keys, expected);

        assert_eq!(out[1]["Date"], json!("2022-01-03T00:00:00.000Z"));
        assert_eq!(out[1]["Activity Type"], json!("Running"));
        assert_eq!(out[1]["Distance (miles)"], json!(0));
        assert_eq!(out[2]["Date"], json!("2025-12-30T00:00:00.000Z"));
        assert_eq!(out[2]["Volume"], Value::Null);
    }

    #[test]
    fn test_reference_conversions() {
        let mut row = raw_row("2025-06-05 08:00:00");
        row.insert("distance".to_string(), json!(1609.34));
        row.insert("minTemperature".to_string(), json!(0.0));
        row.insert("maxTemperature".to_string(), json!(0));

        let out = transform_activities(vec![row]).unwrap();
        let row = &out[0];

        let miles = row["Distance (miles)"].as_f64().unwrap();
        assert!((miles - 1.0).abs() < 1e-5);
        assert_eq!(row["Min Temperature"].as_f64(), Some(32.0));
        assert_eq!(row["Max Temperature"].as_f64(), Some(32.0));
        assert_eq!(row["Duration (HH:MM:SS.sss)"], json!("1:02:05"));
    }

    #[test]
    fn test_first_exercise_set_is_flattened() {
        let mut row = raw_row("2025-06-02 08:00:00");
        row.insert(
            EXERCISE_SETS_COLUMN.to_string(),
            json!(r#"[
                {"category": "BENCH_PRESS", "subCategory": null, "reps": 10, "volume": 50000.0, "duration": 120.0, "sets": 3},
                {"category": "SQUAT", "reps": 0, "volume": 0, "sets": 1}
            ]"#),
        );

        let out = transform_activities(vec![row]).unwrap();
        let row = &out[0];
        assert_eq!(row["Reps"], json!(10));
        assert_eq!(row["Sets"], json!(3));
        // 50 kg is 110.23 lb, rounded up.
        assert_eq!(row["Volume"], json!(111));
        assert_eq!(row["Avg Weight Per Rep"], json!(11.1));
        // The set's duration must not overwrite the activity's.
        assert_eq!(row["Duration (HH:MM:SS.sss)"], json!("1:02:05"));
    }

    #[test]
    fn test_zero_reps_gives_zero_average() {
        let mut row = raw_row("2025-06-03 08:00:00");
        row.insert(
            EXERCISE_SETS_COLUMN.to_string(),
            json!(r#"[{"category": "PLANK", "reps": 0, "volume": 0, "sets": 2}]"#),
        );

        let out = transform_activities(vec![row]).unwrap();
        assert_eq!(out[0]["Avg Weight Per Rep"], json!(0));
        assert_eq!(out[0]["Reps"], json!(0));
    }

    #[test]
    fn test_non_object_activity_type_becomes_null() {
        let mut row = raw_row("2025-06-04 08:00:00");
        row.insert("activityType".to_string(), Value::Null);

        let out = transform_activities(vec![row]).unwrap();
        assert_eq!(out[0]["Activity Type"], Value::Null);
    }

    #[test]
    fn test_missing_source_column_fails() {
        let mut row = raw_row("2025-06-05 08:00:00");
        row.remove("maxStress");

        let err = transform_activities(vec![row]).unwrap_err();
        assert_eq!(err, TransformError::MissingColumn("maxStress"));
    }

    #[test]
    fn test_duplicate_start_time_fails() {
        let err = transform_activities(vec![
            raw_row("2025-06-06 08:00:00"),
            raw_row("2025-06-06 08:00:00"),
        ])
        .unwrap_err();
        assert_eq!(err, TransformError::DuplicateKey("2025-06-06 08:00:00".to_string()));
    }

    #[test]
    fn test_collision_with_placeholder_fails() {
        let err = transform_activities(vec![raw_row(PLACEHOLDER_START_TIMES[0])]).unwrap_err();
        assert!(matches!(err, TransformError::DuplicateKey(_)));
    }

    #[test]
    fn test_empty_input_yields_placeholders_only() {
        let out = transform_activities(Vec::new()).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_undecodable_json_is_kept_as_text() {
        let mut row = raw_row("2025-06-07 08:00:00");
        row.insert("privacy".to_string(), json!("{not json"));

        let out = transform_activities(vec![row]).unwrap();
        // Text has no typeKey, so the privacy setting comes out null.
        assert_eq!(out[0]["Privacy Setting"], Value::Null);
    }

    #[test]
    fn test_average_weight_rounds_volume_up_first() {
        let mut row = raw_row("2025-06-08 08:00:00");
        row.insert(
            EXERCISE_SETS_COLUMN.to_string(),
            json!(r#"[{"reps": 10, "volume": 4535.9, "sets": 1}]"#),
        );

        let out = transform_activities(vec![row]).unwrap();
        assert_eq!(out[0]["Avg Weight Per Rep"], json!(1.0));
        assert_eq!(out[0]["Volume"], json!(10));
    }
}
