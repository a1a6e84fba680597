// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! County case-count source and chart builder.

use crate::error::AppError;
use crate::models::{CaseTable, CountySeries};
use serde::Serialize;

/// Identifier and geography columns not used for display.
const DROPPED_COLUMNS: [&str; 8] = [
    "UID",
    "iso2",
    "iso3",
    "code3",
    "FIPS",
    "Country_Region",
    "Lat",
    "Long_",
];

const COUNTY_COLUMN: &str = "Admin2";
const STATE_COLUMN: &str = "Province_State";
const KEY_COLUMN: &str = "Combined_Key";

#[derive(Debug, thiserror::Error)]
pub enum CovidError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing the {0} column")]
    MissingColumn(&'static str),
}

impl From<CovidError> for AppError {
    fn from(err: CovidError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Download and parse the case table. One request per call, no caching.
pub async fn fetch_case_table(http: &reqwest::Client, url: &str) -> Result<CaseTable, AppError> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Upstream(format!("Case data download failed: {}", e)))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("Case data download failed: {}", e)))?;

    let table = parse_case_csv(body.as_ref())?;
    tracing::debug!(
        rows = table.rows.len(),
        days = table.dates.len(),
        "Case table loaded"
    );
    Ok(table)
}

/// Parse the wide CSV: one row per county, one column per date.
pub fn parse_case_csv<R: std::io::Read>(reader: R) -> Result<CaseTable, CovidError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();

    let position = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CovidError::MissingColumn(name))
    };
    let county_idx = position(COUNTY_COLUMN)?;
    let state_idx = position(STATE_COLUMN)?;
    let key_idx = position(KEY_COLUMN)?;

    let date_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| {
            ![county_idx, state_idx, key_idx].contains(i) && !DROPPED_COLUMNS.contains(h)
        })
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();

        rows.push(CountySeries {
            county: field(county_idx),
            state: field(state_idx),
            combined_key: field(key_idx),
            cumulative: date_columns
                .iter()
                .map(|(idx, _)| parse_count(record.get(*idx).unwrap_or_default()))
                .collect(),
        });
    }

    Ok(CaseTable {
        dates: date_columns.into_iter().map(|(_, d)| d).collect(),
        rows,
    })
}

fn parse_count(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| cell.parse::<f64>().ok().map(|f| f as i64))
}

/// Plotly figure: one line per matching location.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    pub x: Vec<String>,
    pub y: Vec<Option<i64>>,
    pub xaxis: &'static str,
    pub yaxis: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub legend: Legend,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: Title,
    pub tracegroupgap: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: &'static str,
}

/// Daily new cases for the rows matching `county` and `state` exactly.
/// An unknown pair yields a figure with no traces.
pub fn chart_figure(table: &CaseTable, county: &str, state: &str) -> Figure {
    let data = table
        .select(county, state)
        .into_iter()
        .map(|series| Trace {
            kind: "scatter",
            mode: "lines",
            name: series.combined_key.clone(),
            legendgroup: series.combined_key.clone(),
            showlegend: true,
            x: table.dates.clone(),
            y: series.daily_new_cases(),
            xaxis: "x",
            yaxis: "y",
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            xaxis: Axis {
                title: Title { text: "index" },
            },
            yaxis: Axis {
                title: Title { text: "value" },
            },
            legend: Legend {
                title: Title {
                    text: KEY_COLUMN,
                },
                tracegroupgap: 0,
            },
        },
    }
}
