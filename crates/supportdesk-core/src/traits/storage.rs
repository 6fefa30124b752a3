// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for the conversation and message stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SupportError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Conversation, ConversationFilter, ConversationPatch, ConversationSummary, Message,
    MessageSlice, NewConversation, NewMessage,
};

/// Durable CRUD over conversation records. Conversations are never deleted.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Atomically create a conversation and its first (public) message.
    async fn create_conversation(
        &self,
        input: NewConversation,
    ) -> Result<(Conversation, Message), SupportError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, SupportError>;

    /// List conversations with the latest message each, most recently active first.
    ///
    /// Internal notes are only considered for `last_message` when
    /// `include_internal` is set.
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        include_internal: bool,
    ) -> Result<Vec<ConversationSummary>, SupportError>;

    /// Apply a partial update. Returns `None` if the conversation does not exist.
    async fn update_conversation(
        &self,
        id: &str,
        patch: &ConversationPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Conversation>, SupportError>;
}

/// Durable append-only message log keyed by conversation.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, assigning id, timestamps, and insertion sequence.
    async fn append_message(&self, input: NewMessage) -> Result<Message, SupportError>;

    /// Read one slice of the log ordered by `(created_at, sequence)` together
    /// with the total count under the same visibility, from one snapshot.
    async fn page_messages(
        &self,
        conversation_id: &str,
        include_internal: bool,
        offset: u64,
        limit: u64,
    ) -> Result<MessageSlice, SupportError>;

    /// Latest message visible under `include_internal`, if any.
    async fn last_message(
        &self,
        conversation_id: &str,
        include_internal: bool,
    ) -> Result<Option<Message>, SupportError>;
}

/// A complete storage backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter + ConversationStore + MessageStore {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), SupportError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), SupportError>;
}
