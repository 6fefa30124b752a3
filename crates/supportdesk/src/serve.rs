// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `supportdesk serve` command implementation.
//!
//! Opens the SQLite store, loads identities from configuration, installs the
//! Prometheus recorder, and serves the gateway until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use supportdesk_auth::StaticIdentityProvider;
use supportdesk_chat::ChatService;
use supportdesk_config::SupportdeskConfig;
use supportdesk_core::{StorageAdapter, SupportError};
use supportdesk_gateway::{GatewayState, HealthState, ServerConfig};
use supportdesk_prometheus::PrometheusAdapter;
use supportdesk_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::shutdown;

/// Run the server until a shutdown signal arrives.
pub async fn run_serve(config: SupportdeskConfig) -> Result<(), SupportError> {
    init_tracing(&config.log.level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting supportdesk");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let identities = StaticIdentityProvider::new(&config.identities);
    if identities.is_empty() {
        warn!("no identities configured, every request will be rejected with 401");
    } else {
        info!(count = identities.len(), "identities loaded");
    }

    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        match PrometheusAdapter::new() {
            Ok(adapter) => {
                let handle = adapter.handle();
                Some(Arc::new(move || handle.render()))
            }
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        };

    let storage_dyn: Arc<dyn StorageAdapter> = storage.clone();
    let chat = ChatService::new(storage_dyn, Arc::new(identities), config.chat.clone());

    let cancel = shutdown::install_signal_handler();
    spawn_limiter_pruning(
        chat.clone(),
        Duration::from_secs(config.chat.rate_limit_window_secs),
        cancel.clone(),
    );

    let state = GatewayState {
        chat,
        health: HealthState::new(prometheus_render),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let signal = cancel.clone();
    let server = supportdesk_gateway::start_server(&server_config, state, async move {
        signal.cancelled().await;
    });
    tokio::pin!(server);

    // Open WebSocket and SSE connections may outlive the signal; bound the wait.
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    tokio::select! {
        result = &mut server => result?,
        _ = cancel.cancelled() => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    grace_secs = config.server.shutdown_grace_secs,
                    "shutdown grace period elapsed, dropping open connections"
                ),
            }
        }
    }

    storage.close().await?;
    info!("supportdesk serve shutdown complete");
    Ok(())
}

/// Periodically forget rate-limit state for idle senders.
fn spawn_limiter_pruning(chat: ChatService, period: Duration, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    chat.rate_limiter().prune();
                    debug!(
                        senders = chat.rate_limiter().tracked_senders(),
                        "rate limiter pruned"
                    );
                }
                _ = cancel.cancelled() => break,
            }
        }
    });
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("supportdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
