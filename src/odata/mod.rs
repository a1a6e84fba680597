// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A small OData v4 query subset over in-memory records.
//!
//! Supported system query options: `$filter` (single `eq` clause),
//! `$select`, `$orderby`, `$skip`, `$top` and `$count`. Options are always
//! applied in the order filter, select, orderby, skip/top. The count and the
//! continuation link are computed from the filtered, unpaginated set.

pub mod documents;

use crate::models::{scalar_text, Record};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Query parsing failures; all map to 400 Bad Request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("{param} must be a non-negative integer, got {value:?}")]
    InvalidInteger { param: &'static str, value: String },

    #[error("$filter value for Value must be an integer, got {0:?}")]
    InvalidFilterValue(String),

    #[error("Unsupported $filter expression {0:?}: only a single '<field> eq <value>' clause is supported")]
    UnsupportedFilter(String),
}

/// Parsed `$filter` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `<field> eq <value>`, with the value already normalized to text.
    Eq { field: String, value: String },
    /// Anything else; rejected rather than silently ignored.
    Unsupported(String),
}

impl Filter {
    /// Parse a `$filter` expression.
    ///
    /// Only `<field> eq <value>` is understood. Surrounding single quotes
    /// are stripped from the value, and anything inside them is literal.
    /// The `Value` field is numeric, so its right-hand side must parse as an
    /// integer.
    pub fn parse(raw: &str) -> Result<Filter, QueryError> {
        let Some((field, value)) = raw.split_once(" eq ") else {
            return Ok(Filter::Unsupported(raw.to_string()));
        };

        let compound = |text: &str| text.contains(" and ") || text.contains(" or ");
        if compound(field)
            || (!is_quoted_literal(value.trim()) && (value.contains(" eq ") || compound(value)))
        {
            return Ok(Filter::Unsupported(raw.to_string()));
        }

        let field = field.trim().to_string();
        let mut value = value.trim().trim_matches('\'').to_string();

        if field == "Value" {
            let parsed: i64 = value
                .trim()
                .parse()
                .map_err(|_| QueryError::InvalidFilterValue(value.clone()))?;
            value = parsed.to_string();
        }

        Ok(Filter::Eq { field, value })
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq { field, value } => {
                field_text(record, field).is_some_and(|text| &text == value)
            }
            Filter::Unsupported(_) => false,
        }
    }
}

/// A single `'...'` literal, with any embedded quotes doubled.
fn is_quoted_literal(value: &str) -> bool {
    value.len() >= 2
        && value.starts_with('\'')
        && value.ends_with('\'')
        && !value[1..value.len() - 1].replace("''", "").contains('\'')
}

/// Text of `field` as filters and ordering see it. A missing field has
/// none; an explicit null reads as `None`.
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => Some("None".to_string()),
        value => scalar_text(value),
    }
}

/// Parsed `$orderby` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn parse(raw: &str) -> OrderBy {
        if raw.contains(" desc") {
            OrderBy {
                field: raw.replace(" desc", "").trim().to_string(),
                descending: true,
            }
        } else {
            OrderBy {
                field: raw.replace(" asc", "").trim().to_string(),
                descending: false,
            }
        }
    }
}

/// All recognized query options for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub filter: Option<Filter>,
    pub select: Option<Vec<String>>,
    pub order_by: Option<OrderBy>,
    pub skip: usize,
    /// Page size; `None` means unbounded.
    pub top: Option<usize>,
    pub count: bool,
}

impl QueryOptions {
    /// Parse recognized options from ordered query pairs.
    ///
    /// The first occurrence of a parameter wins; unrecognized parameters
    /// are ignored. `default_top` applies when `$top` is absent.
    pub fn parse(
        params: &[(String, String)],
        default_top: Option<usize>,
    ) -> Result<QueryOptions, QueryError> {
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let filter = match get("$filter").map(Filter::parse).transpose()? {
            Some(Filter::Unsupported(raw)) => return Err(QueryError::UnsupportedFilter(raw)),
            other => other,
        };

        let select = get("$select").map(|raw| {
            raw.split(',')
                .map(|f| f.trim().to_string())
                .collect::<Vec<_>>()
        });

        let order_by = get("$orderby").map(OrderBy::parse);

        let skip = match get("$skip") {
            Some(raw) => parse_count_param("$skip", raw)?,
            None => 0,
        };

        let top = match get("$top") {
            Some(raw) => Some(parse_count_param("$top", raw)?),
            None => default_top,
        };

        let count = get("$count").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(QueryOptions {
            filter,
            select,
            order_by,
            skip,
            top,
            count,
        })
    }
}

fn parse_count_param(param: &'static str, raw: &str) -> Result<usize, QueryError> {
    raw.trim().parse().map_err(|_| QueryError::InvalidInteger {
        param,
        value: raw.to_string(),
    })
}

/// Result of applying query options.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// Record count after filtering, before skip/top.
    pub total: usize,
    /// `$skip` value for the next page, when one exists.
    pub next_skip: Option<usize>,
}

/// Apply query options to a record list.
pub fn apply(records: Vec<Record>, options: &QueryOptions) -> Page {
    let mut records = records;

    if let Some(filter) = &options.filter {
        records.retain(|r| filter.matches(r));
    }

    if let Some(fields) = &options.select {
        records = records
            .into_iter()
            .map(|r| select_fields(r, fields))
            .collect();
    }

    if let Some(order) = &options.order_by {
        // sort_by is stable; flipping the comparator keeps ties in input order.
        records.sort_by(|a, b| {
            let ord = compare_field(a, b, &order.field);
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    let total = records.len();
    let skip = options.skip;

    let records: Vec<Record> = match options.top {
        Some(top) => records.into_iter().skip(skip).take(top).collect(),
        None => records.into_iter().skip(skip).collect(),
    };

    let next_skip = options
        .top
        .and_then(|top| skip.checked_add(top))
        .filter(|&next| next < total);

    Page {
        records,
        total,
        next_skip,
    }
}

/// Keep only the listed fields, in the record's own key order.
fn select_fields(record: Record, fields: &[String]) -> Record {
    record
        .into_iter()
        .filter(|(k, _)| fields.iter().any(|f| f == k))
        .collect()
}

fn compare_field(a: &Record, b: &Record, field: &str) -> Ordering {
    let left = field_text(a, field).unwrap_or_default();
    let right = field_text(b, field).unwrap_or_default();
    left.cmp(&right)
}

/// Build a continuation link that repeats the original query with `$skip`
/// advanced and `$top` preserved.
pub fn next_link(
    request_url: &str,
    params: &[(String, String)],
    next_skip: usize,
    top: usize,
) -> String {
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(params.len() + 2);
    for (k, v) in params {
        if !pairs.iter().any(|(existing, _)| existing == k) {
            pairs.push((k.clone(), v.clone()));
        }
    }

    for (key, value) in [("$skip", next_skip), ("$top", top)] {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", request_url, query)
}

/// OData JSON response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "@odata.context")]
    pub context: String,
    #[serde(rename = "@odata.count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(rename = "@odata.nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    pub value: Vec<Record>,
}

/// Run the full query pipeline and wrap the result in an envelope.
///
/// `request_url` is the absolute URL of the entity set without a query
/// string; it prefixes the continuation link.
pub fn respond(
    records: Vec<Record>,
    params: &[(String, String)],
    default_top: Option<usize>,
    context: String,
    request_url: &str,
) -> Result<Envelope, QueryError> {
    let options = QueryOptions::parse(params, default_top)?;
    let page = apply(records, &options);

    tracing::debug!(
        returned = page.records.len(),
        skip = options.skip,
        top = ?options.top,
        total = page.total,
        "OData query applied"
    );

    let next_link = match (page.next_skip, options.top) {
        (Some(next_skip), Some(top)) => Some(next_link(request_url, params, next_skip, top)),
        _ => None,
    };

    Ok(Envelope {
        context,
        count: options.count.then_some(page.total),
        next_link,
        value: page.records,
    })
}
