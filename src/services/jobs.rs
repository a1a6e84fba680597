// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch jobs: pull activities from Garmin Connect into the ingest table,
//! and rebuild the feed table from it.

use crate::config::Config;
use crate::db::{ConnectionProvider, TableStore};
use crate::error::{AppError, Result};
use crate::models::activity::display_columns;
use crate::models::{ACTIVITIES_TABLE, INGESTED_ACTIVITIES_TABLE};
use crate::services::garmin::{GarminClient, MAX_PAGES, PAGE_SIZE};
use crate::services::ingest::IngestBatch;
use crate::services::transform::transform_activities;
use std::path::Path;

/// Where `--schema-only` writes its report by default.
pub const DEFAULT_SCHEMA_REPORT: &str = "activities_schema_analysis.txt";

/// Fetch activities and replace the ingest table, or with `schema_only`
/// write the column report to `output` and leave the database alone.
///
/// Missing credentials or database settings fail before any request. A
/// failed login is logged and the run carries on with whatever the
/// unauthenticated client can fetch, which is normally nothing.
pub async fn run_ingest(config: &Config, schema_only: bool, output: &Path) -> Result<()> {
    let (email, password) = config.garmin.credentials()?;
    if !schema_only {
        config.database.clone()?;
    }
    tracing::info!(domain = %config.garmin.domain, "Using environment credentials for Garmin Connect");

    let mut client = GarminClient::new(&config.garmin.domain)?;
    match client.login(email, password).await {
        Ok(()) => tracing::info!("Garmin Connect login successful"),
        Err(e) => tracing::warn!(error = %e, "Garmin Connect login failed"),
    }

    let activities = client.fetch_pages(PAGE_SIZE, MAX_PAGES).await;
    let batch = IngestBatch::from_activities(activities);

    if schema_only {
        tokio::fs::write(output, batch.schema_report())
            .await
            .map_err(|e| anyhow::anyhow!("writing {}: {}", output.display(), e))?;
        tracing::info!(
            path = %output.display(),
            "Schema analysis written; database left untouched"
        );
        return Ok(());
    }

    let provider = ConnectionProvider::new(config.database.clone()?);
    let result = write_table(&provider, INGESTED_ACTIVITIES_TABLE, &batch.columns, &batch.rows).await;
    provider.close().await;
    result
}

/// Rebuild the feed table from the ingest table.
pub async fn run_transform(config: &Config) -> Result<()> {
    let provider = ConnectionProvider::new(config.database.clone()?);
    let result = transform_tables(&provider).await;
    provider.close().await;
    result
}

async fn transform_tables(provider: &ConnectionProvider) -> Result<()> {
    let pool = provider.pool().await?;
    let raw = TableStore::new(pool)
        .fetch_all(INGESTED_ACTIVITIES_TABLE)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Reading ingested activities failed"))?;
    tracing::info!(count = raw.len(), "Ingested activities loaded");

    let rows = transform_activities(raw)
        .inspect_err(|e| tracing::error!(error = %e, "Activity transform failed"))?;

    let columns: Vec<String> = display_columns().into_iter().map(str::to_string).collect();
    write_table(provider, ACTIVITIES_TABLE, &columns, &rows).await
}

async fn write_table(
    provider: &ConnectionProvider,
    table: &str,
    columns: &[String],
    rows: &[crate::models::Record],
) -> Result<()> {
    let written = async {
        let pool = provider.pool().await?;
        TableStore::new(pool).replace_all(table, columns, rows).await
    }
    .await
    .inspect_err(|e: &AppError| tracing::error!(table, error = %e, "Writing table failed"))?;

    tracing::info!(table, written, "Table replaced");
    Ok(())
}
