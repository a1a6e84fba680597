// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Portfolio server: OData feeds over sample and Garmin Connect activity
//! data, a county-level COVID-19 case visualizer, and the batch jobs that
//! keep the activity tables current.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod odata;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::{Config, ConfigError};
use db::ConnectionProvider;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Outbound client for the case CSV
    pub http: reqwest::Client,
    /// Database access, or why it is unavailable
    pub database: Result<ConnectionProvider, ConfigError>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let database = config.database.clone().map(ConnectionProvider::new);
        Self {
            config,
            http: reqwest::Client::new(),
            database,
        }
    }
}
