// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime subscription registry and fan-out.
//!
//! Two maps make up the registry: sessions by id (identity, outbound queue,
//! subscribed conversations) and conversation id to subscribed session ids.
//! A session lives exactly as long as its [`SessionHandle`]; dropping the
//! handle removes the session and every subscription it held.
//!
//! Publishing never blocks. Each recipient has a bounded queue and an event
//! that does not fit is dropped. Realtime delivery is an optimization;
//! clients reconcile with a paginated fetch on (re)connect.
//!
//! Lock discipline: at most one map guard is held at any time.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use supportdesk_core::Identity;
use supportdesk_core::types::Message;

use crate::visibility;

pub type SessionId = u64;

/// An event delivered to a realtime session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    #[serde(rename_all = "camelCase")]
    MessageCreated {
        conversation_id: String,
        message: Message,
    },
}

struct SessionEntry {
    identity: Identity,
    tx: mpsc::Sender<RealtimeEvent>,
    conversations: HashSet<String>,
}

struct Registry {
    next_id: AtomicU64,
    buffer: usize,
    sessions: DashMap<SessionId, SessionEntry>,
    subscribers: DashMap<String, HashSet<SessionId>>,
}

impl Registry {
    fn close(&self, id: SessionId) {
        let Some((_, entry)) = self.sessions.remove(&id) else {
            return;
        };
        for conversation_id in &entry.conversations {
            self.detach(conversation_id, id);
        }
        supportdesk_prometheus::set_realtime_sessions(self.sessions.len());
        debug!(
            session_id = id,
            subscriptions = entry.conversations.len(),
            "realtime session closed"
        );
    }

    fn detach(&self, conversation_id: &str, id: SessionId) {
        if let Some(mut ids) = self.subscribers.get_mut(conversation_id) {
            ids.remove(&id);
        }
        self.subscribers
            .remove_if(conversation_id, |_, ids| ids.is_empty());
    }
}

/// Shared handle to the subscription registry. Cheap to clone.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    /// `buffer` is the per-session queue depth.
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
                sessions: DashMap::new(),
                subscribers: DashMap::new(),
            }),
        }
    }

    /// Register a session and return its handle and event stream.
    pub fn open_session(&self, identity: Identity) -> (SessionHandle, mpsc::Receiver<RealtimeEvent>) {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.registry.buffer);
        self.registry.sessions.insert(
            id,
            SessionEntry {
                identity: identity.clone(),
                tx,
                conversations: HashSet::new(),
            },
        );
        supportdesk_prometheus::set_realtime_sessions(self.registry.sessions.len());
        debug!(session_id = id, user_id = %identity.id, "realtime session opened");
        (
            SessionHandle {
                id,
                identity,
                registry: Arc::clone(&self.registry),
            },
            rx,
        )
    }

    /// Fan `message` out to the conversation's subscribers it is visible to.
    ///
    /// Returns the number of sessions the event was queued for.
    pub fn publish(&self, message: &Message) -> usize {
        let recipients: Vec<SessionId> = match self.registry.subscribers.get(&message.conversation_id)
        {
            Some(ids) => ids.iter().copied().collect(),
            None => return 0,
        };

        let event = RealtimeEvent::MessageCreated {
            conversation_id: message.conversation_id.clone(),
            message: message.clone(),
        };
        let mut delivered = 0;
        for id in recipients {
            let tx = match self.registry.sessions.get(&id) {
                Some(entry) if visibility::visible_to(entry.identity.role, message) => {
                    entry.tx.clone()
                }
                _ => continue,
            };
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    supportdesk_prometheus::record_broadcast_dropped();
                    let reason = match e {
                        mpsc::error::TrySendError::Full(_) => "queue full",
                        mpsc::error::TrySendError::Closed(_) => "session closed",
                    };
                    warn!(
                        session_id = id,
                        conversation_id = %message.conversation_id,
                        message_id = %message.id,
                        reason,
                        "realtime event dropped"
                    );
                }
            }
        }
        delivered
    }

    pub fn session_count(&self) -> usize {
        self.registry.sessions.len()
    }

    pub fn subscriber_count(&self, conversation_id: &str) -> usize {
        self.registry
            .subscribers
            .get(conversation_id)
            .map_or(0, |ids| ids.len())
    }
}

/// Ownership of one realtime session.
///
/// Subscribing goes through `ChatService::subscribe`, which checks access
/// first. Dropping the handle ends the session.
pub struct SessionHandle {
    id: SessionId,
    identity: Identity,
    registry: Arc<Registry>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns `false` if already subscribed.
    pub(crate) fn subscribe(&self, conversation_id: &str) -> bool {
        let added = match self.registry.sessions.get_mut(&self.id) {
            Some(mut entry) => entry.conversations.insert(conversation_id.to_string()),
            None => return false,
        };
        if added {
            self.registry
                .subscribers
                .entry(conversation_id.to_string())
                .or_default()
                .insert(self.id);
        }
        added
    }

    /// Returns `false` if there was no such subscription.
    pub fn unsubscribe(&self, conversation_id: &str) -> bool {
        let removed = match self.registry.sessions.get_mut(&self.id) {
            Some(mut entry) => entry.conversations.remove(conversation_id),
            None => false,
        };
        if removed {
            self.registry.detach(conversation_id, self.id);
        }
        removed
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.registry
            .sessions
            .get(&self.id)
            .map(|entry| {
                let mut ids: Vec<String> = entry.conversations.iter().cloned().collect();
                ids.sort();
                ids
            })
            .unwrap_or_default()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.registry.close(self.id);
    }
}
