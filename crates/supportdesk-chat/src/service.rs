// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation service: every read and write of conversations and
//! messages, in a fixed order.
//!
//! 1. the conversation id must parse as a UUID and exist (404)
//! 2. the authorization gate decides (403, or 400 for state conflicts)
//! 3. the body is validated and sanitized (400)
//! 4. message creates consume rate-limit quota (429)
//! 5. the store is written, then realtime subscribers are notified
//!
//! Nothing is persisted unless every earlier step passed.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use supportdesk_config::ChatConfig;
use supportdesk_core::types::{
    Conversation, ConversationFilter, ConversationStatus, ConversationSummary, Message,
    NewConversation, NewMessage,
};
use supportdesk_core::{
    HealthStatus, Identity, IdentityProvider, PluginAdapter, StorageAdapter, SupportError,
};

use crate::authz::{self, Decision, Denial, ListScope, Operation};
use crate::broadcast::{Broadcaster, RealtimeEvent, SessionHandle};
use crate::pagination::{MessagePage, PageRequest, Pagination};
use crate::ratelimit::MessageRateLimiter;
use crate::validation;
use crate::visibility;

const CONVERSATION: &str = "conversation";

/// Map a gate decision onto the error taxonomy.
fn enforce(decision: Decision) -> Result<(), SupportError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(Denial::Unauthenticated) => Err(SupportError::Authentication),
        Decision::Deny(Denial::Forbidden) => Err(SupportError::Authorization),
        Decision::Deny(Denial::Conflict(reason)) => Err(SupportError::Conflict(reason.into())),
    }
}

/// A conversation together with the caller's view of its latest message.
pub type ConversationDetail = ConversationSummary;

#[derive(Clone)]
pub struct ChatService {
    storage: Arc<dyn StorageAdapter>,
    identities: Arc<dyn IdentityProvider>,
    broadcaster: Broadcaster,
    limiter: Arc<MessageRateLimiter>,
    config: Arc<ChatConfig>,
}

impl ChatService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        identities: Arc<dyn IdentityProvider>,
        config: ChatConfig,
    ) -> Self {
        Self {
            storage,
            identities,
            broadcaster: Broadcaster::new(config.subscriber_buffer),
            limiter: Arc::new(MessageRateLimiter::from_config(&config)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn rate_limiter(&self) -> &MessageRateLimiter {
        &self.limiter
    }

    /// Health of the backing store.
    pub async fn health(&self) -> HealthStatus {
        match self.storage.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// Resolve a bearer token to an active identity.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, SupportError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Err(SupportError::Authentication);
        };
        match self.identities.resolve(token).await? {
            Some(identity) if identity.is_active => Ok(identity),
            Some(identity) => {
                debug!(user_id = %identity.id, "inactive identity rejected");
                Err(SupportError::Authentication)
            }
            None => Err(SupportError::Authentication),
        }
    }

    /// Load a conversation by id. Ids that are not UUIDs are simply not found.
    async fn load(&self, id: &str) -> Result<Conversation, SupportError> {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(SupportError::NotFound {
                resource: CONVERSATION,
            });
        }
        self.storage
            .get_conversation(id)
            .await?
            .ok_or(SupportError::NotFound {
                resource: CONVERSATION,
            })
    }

    async fn load_authorized(
        &self,
        identity: &Identity,
        id: &str,
        op: Operation,
    ) -> Result<Conversation, SupportError> {
        enforce(authz::admit(identity))?;
        let conversation = self.load(id).await?;
        enforce(authz::decide(identity, Some(&conversation), op))?;
        Ok(conversation)
    }

    /// Conversations the caller may see, most recently active first.
    pub async fn list_conversations(
        &self,
        identity: &Identity,
        status: Option<&str>,
    ) -> Result<Vec<ConversationSummary>, SupportError> {
        enforce(authz::decide(identity, None, Operation::ListConversations))?;
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(raw.parse::<ConversationStatus>().map_err(|_| {
                SupportError::validation(
                    "status",
                    "status must be one of open, in_progress, resolved, closed",
                )
            })?),
        };
        let filter = ConversationFilter {
            client_id: match authz::list_scope(identity) {
                ListScope::All => None,
                ListScope::OwnedBy(id) => Some(id),
            },
            status,
        };
        let role = identity.role;
        let summaries = self
            .storage
            .list_conversations(&filter, visibility::can_see_internal(role))
            .await?;
        Ok(summaries
            .into_iter()
            .map(|s| visibility::filter_summary(role, s))
            .collect())
    }

    pub async fn get_conversation(
        &self,
        identity: &Identity,
        id: &str,
    ) -> Result<ConversationDetail, SupportError> {
        let conversation = self
            .load_authorized(identity, id, Operation::ReadConversation)
            .await?;
        let last_message = self
            .storage
            .last_message(&conversation.id, visibility::can_see_internal(identity.role))
            .await?;
        Ok(visibility::filter_summary(
            identity.role,
            ConversationSummary {
                conversation,
                last_message,
            },
        ))
    }

    /// Open a conversation with its first message. Clients only.
    pub async fn create_conversation(
        &self,
        identity: &Identity,
        body: &Value,
    ) -> Result<(Conversation, Message), SupportError> {
        enforce(authz::decide(identity, None, Operation::CreateConversation))?;
        let input = validation::conversation_input(body, &self.config)?;
        self.limiter.check(&identity.id)?;

        let (conversation, message) = self
            .storage
            .create_conversation(NewConversation {
                client_id: identity.id.clone(),
                subject: input.subject,
                first_message: input.message,
            })
            .await?;

        supportdesk_prometheus::record_conversation_created();
        supportdesk_prometheus::record_message_created(false);
        info!(
            conversation_id = %conversation.id,
            client_id = %conversation.client_id,
            "conversation created"
        );
        Ok((conversation, message))
    }

    /// Apply a staff metadata patch.
    pub async fn update_conversation(
        &self,
        identity: &Identity,
        id: &str,
        body: &Value,
    ) -> Result<Conversation, SupportError> {
        let conversation = self
            .load_authorized(identity, id, Operation::UpdateConversation)
            .await?;
        let patch = validation::conversation_patch(body)?;

        if let Some(Some(assignee)) = &patch.assigned_to {
            let eligible = self
                .identities
                .find_user(assignee)
                .await?
                .is_some_and(|user| user.is_active && user.role.is_staff());
            if !eligible {
                return Err(SupportError::validation(
                    "assignedTo",
                    "assignedTo must reference an active staff member",
                ));
            }
        }

        if patch.is_empty() {
            return Ok(conversation);
        }

        let updated = self
            .storage
            .update_conversation(&conversation.id, &patch, Utc::now())
            .await?
            .ok_or(SupportError::NotFound {
                resource: CONVERSATION,
            })?;
        info!(
            conversation_id = %updated.id,
            user_id = %identity.id,
            status = %updated.status,
            priority = %updated.priority,
            "conversation updated"
        );
        Ok(updated)
    }

    /// One page of the caller's view of the log.
    pub async fn list_messages(
        &self,
        identity: &Identity,
        id: &str,
        request: PageRequest,
    ) -> Result<MessagePage, SupportError> {
        let conversation = self
            .load_authorized(identity, id, Operation::ReadMessages)
            .await?;
        let slice = self
            .storage
            .page_messages(
                &conversation.id,
                visibility::can_see_internal(identity.role),
                request.offset(),
                request.limit,
            )
            .await?;
        Ok(MessagePage {
            messages: visibility::filter(identity.role, slice.messages),
            pagination: Pagination::new(request, slice.total),
        })
    }

    /// Post a message and notify realtime subscribers.
    pub async fn create_message(
        &self,
        identity: &Identity,
        id: &str,
        body: &Value,
    ) -> Result<Message, SupportError> {
        let conversation = self
            .load_authorized(identity, id, Operation::ReadMessages)
            .await?;
        let input = validation::message_input(body, &self.config)?;
        let internal_note = authz::effective_internal_note(identity, input.is_internal_note);
        enforce(authz::decide(
            identity,
            Some(&conversation),
            Operation::CreateMessage { internal_note },
        ))?;
        self.limiter.check(&identity.id)?;

        let message = self
            .storage
            .append_message(NewMessage {
                conversation_id: conversation.id.clone(),
                sender_id: identity.id.clone(),
                content: input.content,
                is_internal_note: internal_note,
                file_ids: input.file_ids,
            })
            .await?;

        supportdesk_prometheus::record_message_created(internal_note);
        let delivered = self.broadcaster.publish(&message);
        info!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            sender_id = %message.sender_id,
            internal_note,
            delivered,
            "message created"
        );
        Ok(message)
    }

    /// Start a realtime session for an authenticated caller.
    pub fn open_session(
        &self,
        identity: Identity,
    ) -> Result<(SessionHandle, mpsc::Receiver<RealtimeEvent>), SupportError> {
        enforce(authz::admit(&identity))?;
        Ok(self.broadcaster.open_session(identity))
    }

    /// Subscribe a session to a conversation it may read.
    pub async fn subscribe(
        &self,
        session: &SessionHandle,
        conversation_id: &str,
    ) -> Result<(), SupportError> {
        let conversation = self
            .load_authorized(session.identity(), conversation_id, Operation::Subscribe)
            .await?;
        if session.subscribe(&conversation.id) {
            debug!(
                session_id = session.id(),
                conversation_id = %conversation.id,
                "subscribed"
            );
        }
        Ok(())
    }

    pub fn unsubscribe(&self, session: &SessionHandle, conversation_id: &str) -> bool {
        session.unsubscribe(conversation_id)
    }
}
