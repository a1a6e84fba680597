// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Portfolio server
//!
//! Serves the OData feeds and the COVID-19 county visualizer, and runs the
//! Garmin Connect ingest and transform jobs.

use clap::{Parser, Subcommand};
use portfolio_server::{
    config::Config,
    services::jobs::{self, DEFAULT_SCHEMA_REPORT},
    AppState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Portfolio web server and activity batch jobs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fetch Garmin Connect activities into the ingest table
    Ingest {
        /// Write a column analysis instead of touching the database
        #[arg(long)]
        schema_only: bool,
        /// Path for the column analysis
        #[arg(long, default_value = DEFAULT_SCHEMA_REPORT)]
        output: PathBuf,
    },
    /// Rebuild the activity feed table from the ingest table
    Transform,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Ingest {
            schema_only,
            output,
        } => Ok(jobs::run_ingest(&config, schema_only, &output).await?),
        Command::Transform => Ok(jobs::run_transform(&config).await?),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(port = config.port, "Starting portfolio server");
    if let Err(e) = &config.database {
        tracing::warn!(error = %e, "Database not configured; activity feed disabled");
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));
    let app = portfolio_server::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_server=debug".parse().expect("valid directive"))
                .add_directive("info".parse().expect("valid directive")),
        )
        .with(format)
        .init();
}
