// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};
use supportdesk_core::Role;

/// Top-level Supportdesk configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupportdeskConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging limits, pagination, and realtime tuning.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Statically provisioned identities (token hash -> user).
    #[serde(default)]
    pub identities: Vec<IdentityConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("supportdesk").join("supportdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("supportdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Messaging limits, pagination defaults, and realtime tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Page size used when a request gives none (or an unusable one).
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper clamp for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum conversation subject length, in characters.
    #[serde(default = "default_max_subject_len")]
    pub max_subject_len: usize,

    /// Maximum message content length, in characters.
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,

    /// Messages a single sender may create per rate-limit window.
    #[serde(default = "default_rate_limit_messages")]
    pub rate_limit_messages: u32,

    /// Rate-limit window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Outbound queue depth per realtime session. Events beyond it are dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_subject_len: default_max_subject_len(),
            max_content_len: default_max_content_len(),
            rate_limit_messages: default_rate_limit_messages(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_max_subject_len() -> usize {
    200
}

fn default_max_content_len() -> usize {
    1000
}

fn default_rate_limit_messages() -> u32 {
    30
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_subscriber_buffer() -> usize {
    64
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One statically provisioned identity.
///
/// Only the SHA-256 of the bearer token is stored; the token itself never
/// appears in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub user_id: String,

    pub role: Role,

    /// Lowercase hex SHA-256 of the bearer token.
    pub token_sha256: String,

    #[serde(default = "default_identity_active")]
    pub active: bool,

    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_identity_active() -> bool {
    true
}
