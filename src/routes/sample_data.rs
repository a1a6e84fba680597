// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OData feed over a fixed six-record sample.

use crate::error::Result;
use crate::models::Record;
use crate::odata::{self, documents};
use crate::routes::feed::{base_url, metadata_xml, odata_json};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{routing::get, Router};
use serde_json::json;
use std::sync::Arc;

const FEED: &str = "sample_data";
const ENTITY_SET: &str = "SampleData";

/// Sample data routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sample_data/$metadata", get(metadata))
        .route("/sample_data", get(service_document))
        .route("/sample_data/", get(service_document))
        .route("/sample_data/SampleData", get(sample_data))
}

/// The sample entity set, ISO dates for spreadsheet compatibility.
pub fn sample_records() -> Vec<Record> {
    [
        ("2025-12-15", 41),
        ("2025-12-16", 52),
        ("2025-12-17", 27),
        ("2025-12-18", 33),
        ("2025-12-19", 42),
        ("2025-12-20", 41),
    ]
    .into_iter()
    .map(|(date, value)| {
        let mut record = Record::new();
        record.insert("Date".to_string(), json!(date));
        record.insert("Value".to_string(), json!(value));
        record
    })
    .collect()
}

async fn metadata() -> Response {
    metadata_xml(documents::SAMPLE_METADATA_XML.to_string())
}

async fn service_document(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let base = base_url(&state.config, &headers);
    odata_json(&documents::ServiceDocument::new(
        format!("{base}{FEED}/$metadata"),
        ENTITY_SET,
        ENTITY_SET,
    ))
}

async fn sample_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let base = base_url(&state.config, &headers);
    let envelope = odata::respond(
        sample_records(),
        &params,
        None,
        format!("{base}{FEED}/$metadata#{ENTITY_SET}"),
        &format!("{base}{FEED}/{ENTITY_SET}"),
    )?;
    Ok(odata_json(&envelope))
}
