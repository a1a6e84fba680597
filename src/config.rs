// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Database settings pick
//! between a direct connection (managed hosting, where `MYSQL_HOST` is
//! present) and an SSH tunnel (local machine).

use std::env;

/// Default source for the US county confirmed-case time series.
pub const DEFAULT_COVID_CSV_URL: &str = "https://raw.githubusercontent.com\
/CSSEGISandData/COVID-19/master\
/csse_covid_19_data/csse_covid_19_time_series\
/time_series_covid19_confirmed_US.csv";

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_SSH_PORT: u16 = 22;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Externally visible base URL (e.g. `https://example.com/`).
    /// When unset the base is derived from request headers.
    pub public_url: Option<String>,
    /// Source of the county case CSV
    pub covid_csv_url: String,
    /// Garmin Connect credentials (batch ingest only)
    pub garmin: GarminSettings,
    /// Database settings, or the reason they could not be assembled.
    pub database: Result<DbConfig, ConfigError>,
}

/// Garmin Connect login settings.
#[derive(Debug, Clone)]
pub struct GarminSettings {
    pub email: Option<String>,
    pub password: Option<String>,
    pub domain: String,
}

impl GarminSettings {
    /// Both credentials, or a configuration error naming them.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ConfigError::Missing("GARMIN_EMAIL, GARMIN_PASSWORD")),
        }
    }
}

/// MySQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub target: DbTarget,
}

/// How to reach the MySQL server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// Running on the managed host: connect straight to `MYSQL_HOST`.
    Direct { host: String, port: u16 },
    /// Running elsewhere: forward a local port over SSH to the remote host.
    Tunnel(TunnelConfig),
}

/// SSH tunnel endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_username: String,
    pub ssh_password: String,
    pub remote_host: String,
    pub remote_port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            public_url: Some("http://localhost:8080/".to_string()),
            covid_csv_url: DEFAULT_COVID_CSV_URL.to_string(),
            garmin: GarminSettings {
                email: None,
                password: None,
                domain: "garmin.com".to_string(),
            },
            database: Err(ConfigError::Missing(
                "MYSQL_USER, MYSQL_PASSWORD, MYSQL_DATABASE",
            )),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Database settings are validated here, but a missing database is not
    /// fatal for the web server: only the activity feed needs it.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            public_url: non_empty(env::var("PUBLIC_URL").ok()),
            covid_csv_url: non_empty(env::var("COVID_CSV_URL").ok())
                .unwrap_or_else(|| DEFAULT_COVID_CSV_URL.to_string()),
            garmin: GarminSettings {
                email: non_empty(env::var("GARMIN_EMAIL").ok()),
                password: non_empty(env::var("GARMIN_PASSWORD").ok()),
                domain: non_empty(env::var("GARMIN_DOMAIN").ok())
                    .unwrap_or_else(|| "garmin.com".to_string()),
            },
            database: DbConfig::from_env(),
        }
    }
}

impl DbConfig {
    /// Assemble database settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Assemble database settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let (Some(user), Some(password), Some(database)) = (
            get("MYSQL_USER"),
            get("MYSQL_PASSWORD"),
            get("MYSQL_DATABASE"),
        ) else {
            return Err(ConfigError::Missing(
                "MYSQL_USER, MYSQL_PASSWORD, MYSQL_DATABASE",
            ));
        };

        // The managed host exports MYSQL_HOST; its mere presence selects the
        // direct connection even if it is empty.
        let target = if let Some(host) = lookup("MYSQL_HOST") {
            if host.trim().is_empty() {
                return Err(ConfigError::Missing("MYSQL_HOST"));
            }
            DbTarget::Direct {
                host,
                port: parse_port(get("MYSQL_PORT"), "MYSQL_PORT", DEFAULT_MYSQL_PORT)?,
            }
        } else {
            let (Some(ssh_host), Some(ssh_username), Some(ssh_password), Some(remote_host)) = (
                get("SSH_HOST"),
                get("SSH_USERNAME"),
                get("SSH_PASSWORD"),
                get("MYSQL_REMOTE_HOST"),
            ) else {
                return Err(ConfigError::MissingTunnel(
                    "SSH_HOST, SSH_USERNAME, SSH_PASSWORD, MYSQL_REMOTE_HOST",
                ));
            };

            DbTarget::Tunnel(TunnelConfig {
                ssh_host,
                ssh_port: parse_port(get("SSH_PORT"), "SSH_PORT", DEFAULT_SSH_PORT)?,
                ssh_username,
                ssh_password,
                remote_host,
                remote_port: parse_port(
                    get("MYSQL_REMOTE_PORT"),
                    "MYSQL_REMOTE_PORT",
                    DEFAULT_MYSQL_PORT,
                )?,
            })
        };

        Ok(Self {
            user,
            password,
            database,
            target,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_port(raw: Option<String>, name: &'static str, default: u16) -> Result<u16, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, value)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    Missing(&'static str),

    #[error("Missing SSH tunnel environment variables: {0}")]
    MissingTunnel(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
