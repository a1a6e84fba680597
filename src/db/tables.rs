// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whole-table reads and replacements over schemaless records.

use crate::error::AppError;
use crate::models::Record;
use crate::time_utils::format_naive_datetime;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlPool, MySqlRow};
use sqlx::query_builder::Separated;
use sqlx::{Column, QueryBuilder, Row, TypeInfo};
use std::ops::Range;

/// Rows written per chunk.
const INSERT_CHUNK: usize = 1000;

/// Upper bound on placeholders in one MySQL prepared statement.
const MAX_BIND_PARAMS: usize = 65_535;

pub struct TableStore<'a> {
    pool: &'a MySqlPool,
}

impl<'a> TableStore<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Empty `table` and insert `rows`, writing `columns` in order.
    ///
    /// The truncate commits on its own, so a failed insert leaves the table
    /// empty. Inserts run in a single transaction. Fields missing from a row
    /// are written as NULL.
    #[tracing::instrument(skip(self, columns, rows), fields(rows = rows.len()))]
    pub async fn replace_all(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Record],
    ) -> Result<u64, AppError> {
        sqlx::query(&format!("TRUNCATE TABLE {}", quote_ident(table)))
            .execute(self.pool)
            .await?;
        tracing::info!(table, "Table truncated");

        if rows.is_empty() {
            return Ok(0);
        }
        if columns.is_empty() {
            return Err(AppError::Database(format!(
                "No columns to write to {}",
                table
            )));
        }

        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for range in statement_batches(rows.len(), columns.len()) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quote_ident(table),
                column_list
            ));
            builder.push_values(&rows[range], |mut values, row| {
                for column in columns {
                    bind_value(&mut values, row.get(column));
                }
            });

            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        tracing::info!(table, written, "Rows written");
        Ok(written)
    }

    /// Read every row of `table`, decoding each column by its SQL type.
    pub async fn fetch_all(&self, table: &str) -> Result<Vec<Record>, AppError> {
        let rows = sqlx::query(&format!("SELECT * FROM {}", quote_ident(table)))
            .fetch_all(self.pool)
            .await?;

        let records = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(table, count = records.len(), "Rows loaded");
        Ok(records)
    }
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Row ranges for each INSERT statement: chunks of [`INSERT_CHUNK`],
/// further split so no statement exceeds the placeholder limit.
fn statement_batches(total_rows: usize, ncols: usize) -> Vec<Range<usize>> {
    let per_statement = (MAX_BIND_PARAMS / ncols.max(1)).clamp(1, INSERT_CHUNK);

    let mut batches = Vec::new();
    let mut chunk_start = 0;
    while chunk_start < total_rows {
        let chunk_end = (chunk_start + INSERT_CHUNK).min(total_rows);
        let mut start = chunk_start;
        while start < chunk_end {
            let end = (start + per_statement).min(chunk_end);
            batches.push(start..end);
            start = end;
        }
        chunk_start = chunk_end;
    }
    batches
}

/// A JSON scalar in the form it is bound to a MySQL placeholder.
#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    /// Missing fields bind as NULL; nested values as their JSON text.
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SqlParam::Null,
            Some(Value::Bool(b)) => SqlParam::Bool(*b),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    SqlParam::Int(i)
                } else if let Some(u) = n.as_u64() {
                    SqlParam::UInt(u)
                } else {
                    n.as_f64().map_or(SqlParam::Null, SqlParam::Float)
                }
            }
            Some(Value::String(s)) => SqlParam::Text(s.clone()),
            Some(other) => SqlParam::Text(other.to_string()),
        }
    }
}

fn bind_value(values: &mut Separated<'_, '_, MySql, &'static str>, value: Option<&Value>) {
    match SqlParam::from_value(value) {
        SqlParam::Null => values.push_bind(None::<String>),
        SqlParam::Bool(b) => values.push_bind(b),
        SqlParam::Int(i) => values.push_bind(i),
        SqlParam::UInt(u) => values.push_bind(u),
        SqlParam::Float(f) => values.push_bind(f),
        SqlParam::Text(s) => values.push_bind(s),
    };
}

fn decode_row(row: &MySqlRow) -> Result<Record, AppError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// How a column's SQL type maps onto a JSON scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    DateTime,
    Date,
    Null,
    Text,
}

impl ColumnKind {
    fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                ColumnKind::Signed
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => ColumnKind::Unsigned,
            "FLOAT" => ColumnKind::Float,
            "DOUBLE" => ColumnKind::Double,
            "DECIMAL" => ColumnKind::Decimal,
            "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
            "DATE" => ColumnKind::Date,
            "NULL" => ColumnKind::Null,
            _ => ColumnKind::Text,
        }
    }
}

/// DECIMAL text as a number when it fits an `f64`, else kept as text.
fn decimal_value(text: String) -> Value {
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(text),
    }
}

fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match ColumnKind::from_type_name(type_name) {
        ColumnKind::Signed => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        ColumnKind::Unsigned => row.try_get::<Option<u64>, _>(idx)?.map(Value::from),
        ColumnKind::Float => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|f| Value::from(f64::from(f))),
        ColumnKind::Double => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
        ColumnKind::Decimal => row
            .try_get_unchecked::<Option<String>, _>(idx)?
            .map(decimal_value),
        ColumnKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|dt| Value::String(format_naive_datetime(dt))),
        ColumnKind::Date => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|d| Value::String(d.to_string())),
        ColumnKind::Null => None,
        ColumnKind::Text => row
            .try_get_unchecked::<Option<String>, _>(idx)?
            .map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Distance (miles)"), "`Distance (miles)`");
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_batches_follow_chunk_size() {
        assert_eq!(
            statement_batches(2500, 58),
            vec![0..1000, 1000..2000, 2000..2500]
        );
    }

    #[test]
    fn test_wide_tables_split_chunks() {
        // 100 columns allow 655 rows per statement.
        assert_eq!(
            statement_batches(1200, 100),
            vec![0..655, 655..1000, 1000..1200]
        );
    }

    #[test]
    fn test_no_rows_no_batches() {
        assert!(statement_batches(0, 10).is_empty());
    }

    #[test]
    fn test_sql_param_from_json_scalars() {
        use serde_json::json;

        assert_eq!(SqlParam::from_value(None), SqlParam::Null);
        assert_eq!(SqlParam::from_value(Some(&Value::Null)), SqlParam::Null);
        assert_eq!(SqlParam::from_value(Some(&json!(true))), SqlParam::Bool(true));
        assert_eq!(SqlParam::from_value(Some(&json!(-3))), SqlParam::Int(-3));
        assert_eq!(
            SqlParam::from_value(Some(&json!(u64::MAX))),
            SqlParam::UInt(u64::MAX)
        );
        assert_eq!(SqlParam::from_value(Some(&json!(1.5))), SqlParam::Float(1.5));
        assert_eq!(
            SqlParam::from_value(Some(&json!("Running"))),
            SqlParam::Text("Running".to_string())
        );
        assert_eq!(
            SqlParam::from_value(Some(&json!({"typeKey": "running"}))),
            SqlParam::Text(r#"{"typeKey":"running"}"#.to_string())
        );
    }

    #[test]
    fn test_column_kind_from_type_name() {
        assert_eq!(ColumnKind::from_type_name("BOOLEAN"), ColumnKind::Signed);
        assert_eq!(ColumnKind::from_type_name("BIGINT"), ColumnKind::Signed);
        assert_eq!(
            ColumnKind::from_type_name("INT UNSIGNED"),
            ColumnKind::Unsigned
        );
        assert_eq!(ColumnKind::from_type_name("FLOAT"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_type_name("DOUBLE"), ColumnKind::Double);
        assert_eq!(ColumnKind::from_type_name("DECIMAL"), ColumnKind::Decimal);
        assert_eq!(ColumnKind::from_type_name("TIMESTAMP"), ColumnKind::DateTime);
        assert_eq!(ColumnKind::from_type_name("DATE"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_type_name("NULL"), ColumnKind::Null);
        assert_eq!(ColumnKind::from_type_name("VARCHAR"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_name("TEXT"), ColumnKind::Text);
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value("12.50".to_string()), Value::from(12.5));
        assert_eq!(
            decimal_value("not-a-number".to_string()),
            Value::String("not-a-number".to_string())
        );
    }

    #[test]
    fn test_batches_respect_placeholder_limit() {
        for ncols in [1, 58, 66, 300, 70_000] {
            for range in statement_batches(3000, ncols) {
                assert!(range.len() * ncols <= MAX_BIND_PARAMS || range.len() == 1);
            }
        }
    }
}
