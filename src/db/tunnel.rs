// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local port forward to the hosted MySQL server over SSH.

use crate::config::TunnelConfig;
use crate::error::AppError;
use async_trait::async_trait;
use russh::client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client handler. Host keys are not pinned.
struct AcceptHostKey;

#[async_trait]
impl client::Handler for AcceptHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// An open SSH session forwarding `127.0.0.1:<local_port>` to the remote
/// MySQL host.
pub struct SshTunnel {
    local_port: u16,
    session: Arc<client::Handle<AcceptHostKey>>,
    accept_task: JoinHandle<()>,
}

impl SshTunnel {
    pub async fn open(config: &TunnelConfig) -> Result<Self, AppError> {
        let ssh_config = Arc::new(client::Config::default());
        let addr = (config.ssh_host.as_str(), config.ssh_port);

        let mut session = tokio::time::timeout(
            CONNECT_TIMEOUT,
            client::connect(ssh_config, addr, AcceptHostKey),
        )
        .await
        .map_err(|_| {
            AppError::Database(format!(
                "SSH connection to {} timed out",
                config.ssh_host
            ))
        })?
        .map_err(|e| AppError::Database(format!("SSH connection failed: {}", e)))?;

        let authenticated = session
            .authenticate_password(&config.ssh_username, &config.ssh_password)
            .await
            .map_err(|e| AppError::Database(format!("SSH authentication failed: {}", e)))?;
        if !authenticated {
            return Err(AppError::Database(
                "SSH authentication rejected".to_string(),
            ));
        }

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AppError::Database(format!("Failed to bind tunnel port: {}", e)))?;
        let local_port = listener
            .local_addr()
            .map_err(|e| AppError::Database(format!("Failed to bind tunnel port: {}", e)))?
            .port();

        let session = Arc::new(session);
        let accept_task = tokio::spawn(forward_connections(
            listener,
            session.clone(),
            config.remote_host.clone(),
            config.remote_port,
        ));

        tracing::info!(
            ssh_host = %config.ssh_host,
            remote_host = %config.remote_host,
            local_port,
            "SSH tunnel established"
        );

        Ok(Self {
            local_port,
            session,
            accept_task,
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Stop accepting connections and disconnect the SSH session.
    pub async fn close(self) {
        self.accept_task.abort();
        if let Err(e) = self
            .session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::warn!(error = %e, "SSH disconnect failed");
        }
        tracing::info!("SSH tunnel closed");
    }
}

async fn forward_connections(
    listener: TcpListener,
    session: Arc<client::Handle<AcceptHostKey>>,
    remote_host: String,
    remote_port: u16,
) {
    loop {
        let (mut socket, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Tunnel accept failed");
                continue;
            }
        };

        let session = session.clone();
        let remote_host = remote_host.clone();
        tokio::spawn(async move {
            let channel = match session
                .channel_open_direct_tcpip(
                    remote_host.as_str(),
                    u32::from(remote_port),
                    "127.0.0.1",
                    u32::from(peer.port()),
                )
                .await
            {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to open forwarding channel");
                    return;
                }
            };

            let mut stream = channel.into_stream();
            if let Err(e) = tokio::io::copy_bidirectional(&mut socket, &mut stream).await {
                tracing::debug!(error = %e, "Forwarded connection ended");
            }
        });
    }
}
