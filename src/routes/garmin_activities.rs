// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OData feed over the transformed Garmin activity table.

use crate::db::TableStore;
use crate::error::{AppError, Result};
use crate::models::activity::odata_name_for_display;
use crate::models::{scalar_text, Record, ACTIVITIES_TABLE};
use crate::odata::{self, documents};
use crate::routes::feed::{base_url, metadata_xml, odata_json};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::{routing::get, Router};
use serde_json::Value;
use std::sync::Arc;

const FEED: &str = "garmin_activities";
const ENTITY_SET: &str = "Activities";

/// Page size when the client gives no `$top`.
const DEFAULT_TOP: usize = 1000;

/// Properties exposed as text even when stored as flags.
const TEXT_FLAGS: [&str; 2] = ["PR", "ManualActivity"];

/// Garmin activity routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/garmin_activities/$metadata", get(metadata))
        .route("/garmin_activities", get(service_document))
        .route("/garmin_activities/", get(service_document))
        .route("/garmin_activities/Activities", get(activities))
        .route("/garmin_activities/activities", get(activities))
}

async fn metadata() -> Response {
    metadata_xml(documents::activity_metadata_xml())
}

async fn service_document(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let base = base_url(&state.config, &headers);
    odata_json(&documents::ServiceDocument::new(
        format!("{base}{FEED}/$metadata"),
        ENTITY_SET,
        ENTITY_SET,
    ))
}

async fn activities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let provider = state
        .database
        .as_ref()
        .map_err(|e| AppError::Config(e.clone()))?;
    let pool = provider.pool().await?;

    let rows = TableStore::new(pool).fetch_all(ACTIVITIES_TABLE).await?;
    let records: Vec<Record> = rows.into_iter().map(to_feed_record).collect();

    let base = base_url(&state.config, &headers);
    let request_url = format!("{}{}", base.trim_end_matches('/'), uri.path());

    let envelope = odata::respond(
        records,
        &params,
        Some(DEFAULT_TOP),
        format!("{base}{FEED}/$metadata#{ENTITY_SET}"),
        &request_url,
    )?;
    Ok(odata_json(&envelope))
}

/// Rename stored display columns to OData property names.
fn to_feed_record(row: Record) -> Record {
    row.into_iter()
        .map(|(column, value)| {
            let name = odata_name_for_display(&column)
                .map(str::to_string)
                .unwrap_or(column);
            let value = if TEXT_FLAGS.contains(&name.as_str()) {
                scalar_text(&value).map_or(Value::Null, Value::String)
            } else {
                value
            };
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_feed_record_renames_and_stringifies_flags() {
        let row = json!({
            "Activity Type": "Running",
            "Distance (miles)": 3.1,
            "PR": 1,
            "Manual Activity": null,
            "Extra Column": "kept"
        });
        let record = to_feed_record(row.as_object().unwrap().clone());

        assert_eq!(
            Value::Object(record),
            json!({
                "ActivityType": "Running",
                "DistanceMiles": 3.1,
                "PR": "1",
                "ManualActivity": null,
                "Extra Column": "kept"
            })
        );
    }
}
