// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across stores, the chat service, and the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Identity,
    Observability,
}

/// Caller role as issued by the identity provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Client,
    Team,
    Admin,
}

impl Role {
    /// Team members and admins are collectively staff.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Team | Role::Admin)
    }
}

/// A resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub role: Role,
    pub is_active: bool,
}

impl Identity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            is_active: true,
        }
    }
}

/// Conversation lifecycle state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// Conversation triage priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// A client-support thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    /// Owning client. Never changes after creation.
    pub client_id: String,
    pub subject: String,
    pub status: ConversationStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    /// Time of the latest public message. Internal notes never move it.
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single entry in a conversation's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// UUID v7, globally unique.
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_internal_note: bool,
    #[serde(default)]
    pub file_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion sequence, the tie-breaker after `created_at`.
    #[serde(skip)]
    pub sequence: i64,
}

/// A conversation together with its latest message visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

/// Input for creating a conversation together with its first message.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub client_id: String,
    pub subject: String,
    pub first_message: String,
}

/// Input for appending a message. The store assigns id, timestamps, and sequence.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_internal_note: bool,
    pub file_ids: Vec<String>,
}

/// Partial metadata update. `None` leaves a field untouched.
///
/// `assigned_to` is doubly optional: `Some(None)` clears the assignee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPatch {
    pub status: Option<ConversationStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Option<String>>,
}

impl ConversationPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.assigned_to.is_none()
    }
}

/// Filter for conversation listing.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    /// Restrict to one owner. `None` means every conversation.
    pub client_id: Option<String>,
    pub status: Option<ConversationStatus>,
}

/// One page slice of a conversation's log plus the filtered total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSlice {
    pub messages: Vec<Message>,
    pub total: u64,
}
