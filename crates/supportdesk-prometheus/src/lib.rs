// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus exporter for Supportdesk metrics.
//!
//! Metrics are recorded through the `metrics` facade (see [`recording`]) and
//! rendered as Prometheus text by the gateway's `/metrics` endpoint.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use supportdesk_core::types::{AdapterType, HealthStatus};
use supportdesk_core::{PluginAdapter, SupportError};

pub use recording::{
    record_broadcast_dropped, record_conversation_created, record_message_created,
    record_rate_limited, set_realtime_sessions,
};

/// Owns the process-wide Prometheus recorder handle.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can exist per process; a second call fails.
    pub fn new() -> Result<Self, SupportError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            SupportError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;
        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    pub fn handle(&self) -> PrometheusHandle {
        self.handle.clone()
    }

    /// Current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, SupportError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupportError> {
        Ok(())
    }
}
