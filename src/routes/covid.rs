// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! County case visualizer pages.

use crate::error::{AppError, Result};
use crate::services::covid::{chart_figure, fetch_case_table};
use crate::views;
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::{routing::get, Router};
use serde::Deserialize;
use std::sync::Arc;

/// COVID visualizer routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/covid-by-county", get(covid_home))
        .route("/covid-by-county/", get(covid_home))
        .route("/covid-by-county/graph", get(covid_graph))
}

#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    pub county: Option<String>,
    pub state: Option<String>,
}

async fn covid_home(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let table = fetch_case_table(&state.http, &state.config.covid_csv_url).await?;
    Ok(Html(views::covid_page(&table, None)))
}

async fn covid_graph(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GraphQuery>,
) -> Result<Html<String>> {
    let (Some(county), Some(state_name)) = (query.county, query.state) else {
        return Err(AppError::BadRequest(
            "county and state query parameters are required".to_string(),
        ));
    };

    let table = fetch_case_table(&state.http, &state.config.covid_csv_url).await?;
    let figure = chart_figure(&table, &county, &state_name);
    tracing::debug!(
        county = %county,
        state = %state_name,
        series = figure.data.len(),
        "Case chart built"
    );

    Ok(Html(views::covid_page(&table, Some(&figure))))
}
