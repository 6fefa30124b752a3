// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation queries.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use supportdesk_core::SupportError;
use supportdesk_core::types::{
    Conversation, ConversationFilter, ConversationPatch, ConversationStatus, ConversationSummary,
    Message, NewConversation, Priority,
};

use crate::database::{Database, map_tr_err};
use crate::models::{
    CONVERSATION_COLUMNS, conversation_from_row, encode_ts, now,
};
use crate::queries::messages::{insert_message_row, latest_message};

/// Create a conversation and its first public message in one transaction.
pub async fn create_conversation(
    db: &Database,
    input: NewConversation,
) -> Result<(Conversation, Message), SupportError> {
    let ts = now();
    let conversation = Conversation {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: input.client_id,
        subject: input.subject,
        status: ConversationStatus::Open,
        priority: Priority::Normal,
        assigned_to: None,
        last_message_at: ts,
        created_at: ts,
        updated_at: ts,
    };
    let mut message = Message {
        id: uuid::Uuid::now_v7().to_string(),
        conversation_id: conversation.id.clone(),
        sender_id: conversation.client_id.clone(),
        content: input.first_message,
        is_internal_note: false,
        file_ids: Vec::new(),
        created_at: ts,
        updated_at: ts,
        sequence: 0,
    };

    let row = conversation.clone();
    let first = message.clone();
    let sequence = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            let tx = conn.transaction()?;
            let stamp = encode_ts(&row.created_at);
            tx.execute(
                "INSERT INTO conversations (id, client_id, subject, status, priority, \
                 assigned_to, last_message_at, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6, ?6)",
                params![
                    row.id,
                    row.client_id,
                    row.subject,
                    row.status.to_string(),
                    row.priority.to_string(),
                    stamp,
                ],
            )?;
            let sequence = insert_message_row(&tx, &first)?;
            tx.commit()?;
            Ok(sequence)
        })
        .await
        .map_err(map_tr_err)?;

    message.sequence = sequence;
    Ok((conversation, message))
}

pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, SupportError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            select_conversation(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

fn select_conversation(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<Conversation>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
        params![id],
        conversation_from_row,
    )
    .optional()
}

/// Conversations matching `filter`, most recently active first, each with
/// its latest message under the given visibility.
pub async fn list_conversations(
    db: &Database,
    filter: &ConversationFilter,
    include_internal: bool,
) -> Result<Vec<ConversationSummary>, SupportError> {
    let client_id = filter.client_id.clone();
    let status = filter.status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<ConversationSummary>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let conversations = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations \
                     WHERE (?1 IS NULL OR client_id = ?1) AND (?2 IS NULL OR status = ?2) \
                     ORDER BY last_message_at DESC, created_at DESC, id"
                ))?;
                let rows = stmt.query_map(params![client_id, status], conversation_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };

            let mut summaries = Vec::with_capacity(conversations.len());
            for conversation in conversations {
                let last_message = latest_message(&tx, &conversation.id, include_internal)?;
                summaries.push(ConversationSummary {
                    conversation,
                    last_message,
                });
            }
            tx.commit()?;
            Ok(summaries)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply only the fields present in `patch` with one `UPDATE`.
///
/// Returns `None` when the conversation does not exist. An empty patch is a
/// read and leaves `updated_at` alone.
pub async fn update_conversation(
    db: &Database,
    id: &str,
    patch: &ConversationPatch,
    at: DateTime<Utc>,
) -> Result<Option<Conversation>, SupportError> {
    let id = id.to_string();
    if patch.is_empty() {
        return get_conversation(db, &id).await;
    }

    let status = patch.status.map(|s| s.to_string());
    let priority = patch.priority.map(|p| p.to_string());
    let set_assignee = patch.assigned_to.is_some();
    let assignee = patch.assigned_to.clone().flatten();
    let stamp = encode_ts(&at);
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE conversations SET \
                 status = COALESCE(?2, status), \
                 priority = COALESCE(?3, priority), \
                 assigned_to = CASE WHEN ?4 THEN ?5 ELSE assigned_to END, \
                 updated_at = MAX(updated_at, ?6) \
                 WHERE id = ?1",
                params![id, status, priority, set_assignee, assignee, stamp],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let updated = select_conversation(&tx, &id)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::append_message;
    use supportdesk_core::types::NewMessage;
    use tempfile::TempDir;

    async fn setup() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap(), true)
            .await
            .unwrap();
        (db, dir)
    }

    fn new_conversation(client: &str, subject: &str) -> NewConversation {
        NewConversation {
            client_id: client.to_string(),
            subject: subject.to_string(),
            first_message: format!("{subject} body"),
        }
    }

    #[tokio::test]
    async fn create_persists_conversation_and_first_message() {
        let (db, _dir) = setup().await;
        let (conversation, message) = create_conversation(&db, new_conversation("c1", "Help"))
            .await
            .unwrap();
        assert_eq!(conversation.status, ConversationStatus::Open);
        assert_eq!(conversation.priority, Priority::Normal);
        assert_eq!(message.conversation_id, conversation.id);
        assert_eq!(message.sender_id, "c1");
        assert!(!message.is_internal_note);
        assert!(message.sequence > 0);

        let loaded = get_conversation(&db, &conversation.id).await.unwrap().unwrap();
        assert_eq!(loaded, conversation);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let (db, _dir) = setup().await;
        assert!(get_conversation(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_status() {
        let (db, _dir) = setup().await;
        let (a, _) = create_conversation(&db, new_conversation("c1", "A")).await.unwrap();
        create_conversation(&db, new_conversation("c2", "B")).await.unwrap();

        let mine = list_conversations(
            &db,
            &ConversationFilter {
                client_id: Some("c1".into()),
                status: None,
            },
            false,
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].conversation.id, a.id);

        let patch = ConversationPatch {
            status: Some(ConversationStatus::Closed),
            ..Default::default()
        };
        update_conversation(&db, &a.id, &patch, now()).await.unwrap();
        let closed = list_conversations(
            &db,
            &ConversationFilter {
                client_id: None,
                status: Some(ConversationStatus::Closed),
            },
            true,
        )
        .await
        .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].conversation.id, a.id);
    }

    #[tokio::test]
    async fn list_orders_by_latest_activity_and_hides_notes() {
        let (db, _dir) = setup().await;
        let (old, _) = create_conversation(&db, new_conversation("c1", "Old")).await.unwrap();
        let (_newer, _) = create_conversation(&db, new_conversation("c1", "New")).await.unwrap();

        append_message(
            &db,
            NewMessage {
                conversation_id: old.id.clone(),
                sender_id: "c1".into(),
                content: "bump".into(),
                is_internal_note: false,
                file_ids: vec![],
            },
        )
        .await
        .unwrap();
        append_message(
            &db,
            NewMessage {
                conversation_id: old.id.clone(),
                sender_id: "staff".into(),
                content: "secret note".into(),
                is_internal_note: true,
                file_ids: vec![],
            },
        )
        .await
        .unwrap();

        let client_view = list_conversations(&db, &ConversationFilter::default(), false)
            .await
            .unwrap();
        assert_eq!(client_view[0].conversation.id, old.id);
        assert_eq!(
            client_view[0].last_message.as_ref().unwrap().content,
            "bump"
        );

        let staff_view = list_conversations(&db, &ConversationFilter::default(), true)
            .await
            .unwrap();
        assert_eq!(
            staff_view[0].last_message.as_ref().unwrap().content,
            "secret note"
        );
    }

    #[tokio::test]
    async fn patch_touches_only_present_fields() {
        let (db, _dir) = setup().await;
        let (conversation, _) = create_conversation(&db, new_conversation("c1", "Help"))
            .await
            .unwrap();

        let assign = ConversationPatch {
            assigned_to: Some(Some("agent-1".into())),
            ..Default::default()
        };
        update_conversation(&db, &conversation.id, &assign, now()).await.unwrap();

        let prioritise = ConversationPatch {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let updated = update_conversation(&db, &conversation.id, &prioritise, now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.assigned_to.as_deref(), Some("agent-1"));
        assert_eq!(updated.status, ConversationStatus::Open);
        assert_eq!(updated.client_id, "c1");

        let unassign = ConversationPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        let cleared = update_conversation(&db, &conversation.id, &unassign, now())
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.assigned_to.is_none());
        assert_eq!(cleared.priority, Priority::High);
    }

    #[tokio::test]
    async fn concurrent_single_field_patches_all_land() {
        let (db, _dir) = setup().await;
        let (conversation, _) = create_conversation(&db, new_conversation("c1", "Help"))
            .await
            .unwrap();
        let db = std::sync::Arc::new(db);
        let patches = [
            ConversationPatch {
                status: Some(ConversationStatus::InProgress),
                ..Default::default()
            },
            ConversationPatch {
                priority: Some(Priority::High),
                ..Default::default()
            },
            ConversationPatch {
                assigned_to: Some(Some("agent-1".into())),
                ..Default::default()
            },
        ];

        let mut handles = Vec::new();
        for patch in patches {
            let db = db.clone();
            let id = conversation.id.clone();
            handles.push(tokio::spawn(async move {
                update_conversation(&db, &id, &patch, now()).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let merged = get_conversation(&db, &conversation.id).await.unwrap().unwrap();
        assert_eq!(merged.status, ConversationStatus::InProgress);
        assert_eq!(merged.priority, Priority::High);
        assert_eq!(merged.assigned_to.as_deref(), Some("agent-1"));
        assert!(merged.updated_at >= conversation.updated_at);
    }

    #[tokio::test]
    async fn patch_unknown_is_none() {
        let (db, _dir) = setup().await;
        let patch = ConversationPatch {
            status: Some(ConversationStatus::Resolved),
            ..Default::default()
        };
        assert!(
            update_conversation(&db, "missing", &patch, now())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn empty_patch_returns_current_record() {
        let (db, _dir) = setup().await;
        let (conversation, _) = create_conversation(&db, new_conversation("c1", "Help"))
            .await
            .unwrap();
        let same = update_conversation(&db, &conversation.id, &ConversationPatch::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same, conversation);
    }
}
