// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use supportdesk_config::model::StorageConfig;
use supportdesk_core::types::{
    Conversation, ConversationFilter, ConversationPatch, ConversationSummary, Message,
    MessageSlice, NewConversation, NewMessage,
};
use supportdesk_core::{
    AdapterType, ConversationStore, HealthStatus, MessageStore, PluginAdapter, StorageAdapter,
    SupportError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed conversation and message store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, SupportError> {
        self.db.get().ok_or_else(|| SupportError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SupportError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let ping = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err);
        Ok(match ping {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), SupportError> {
        if let Some(db) = self.db.get()
            && self.config.wal_mode
        {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), SupportError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SupportError::Storage {
            source: "storage already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), SupportError> {
        self.shutdown().await?;
        debug!("SQLite storage closed");
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn create_conversation(
        &self,
        input: NewConversation,
    ) -> Result<(Conversation, Message), SupportError> {
        queries::conversations::create_conversation(self.db()?, input).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, SupportError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        include_internal: bool,
    ) -> Result<Vec<ConversationSummary>, SupportError> {
        queries::conversations::list_conversations(self.db()?, filter, include_internal).await
    }

    async fn update_conversation(
        &self,
        id: &str,
        patch: &ConversationPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Conversation>, SupportError> {
        queries::conversations::update_conversation(self.db()?, id, patch, now).await
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn append_message(&self, input: NewMessage) -> Result<Message, SupportError> {
        queries::messages::append_message(self.db()?, input).await
    }

    async fn page_messages(
        &self,
        conversation_id: &str,
        include_internal: bool,
        offset: u64,
        limit: u64,
    ) -> Result<MessageSlice, SupportError> {
        queries::messages::page_messages(self.db()?, conversation_id, include_internal, offset, limit)
            .await
    }

    async fn last_message(
        &self,
        conversation_id: &str,
        include_internal: bool,
    ) -> Result<Option<Message>, SupportError> {
        queries::messages::last_message(self.db()?, conversation_id, include_internal).await
    }
}
