// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lazily established MySQL connection pool.

use crate::config::{DbConfig, DbTarget};
use crate::db::tunnel::SshTunnel;
use crate::error::AppError;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the tunnel (when one is needed) and the pool built on top of it.
///
/// Nothing is opened until the first call to [`ConnectionProvider::pool`];
/// later calls reuse the same pool. Connections are pinged before being
/// handed out, so ones dropped by the server are replaced.
pub struct ConnectionProvider {
    config: DbConfig,
    tunnel: OnceCell<SshTunnel>,
    pool: OnceCell<MySqlPool>,
}

impl ConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            tunnel: OnceCell::new(),
            pool: OnceCell::new(),
        }
    }

    pub async fn pool(&self) -> Result<&MySqlPool, AppError> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<MySqlPool, AppError> {
        let (host, port) = match &self.config.target {
            DbTarget::Direct { host, port } => (host.clone(), *port),
            DbTarget::Tunnel(tunnel_config) => {
                let tunnel = self
                    .tunnel
                    .get_or_try_init(|| SshTunnel::open(tunnel_config))
                    .await?;
                ("127.0.0.1".to_string(), tunnel.local_port())
            }
        };

        let options = MySqlConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!(
            host = %host,
            port,
            database = %self.config.database,
            "Connected to MySQL"
        );
        Ok(pool)
    }

    /// Close the pool and tear down the tunnel.
    pub async fn close(mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        if let Some(tunnel) = self.tunnel.take() {
            tunnel.close().await;
        }
    }
}
