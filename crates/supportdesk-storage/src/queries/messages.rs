// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log queries.
//!
//! Order within a conversation is `(created_at, seq)`. `created_at` is never
//! allowed to run backwards inside one conversation, so appends always land
//! at the end of that order and offset paging cannot repeat an id.

use rusqlite::{OptionalExtension, params};
use supportdesk_core::SupportError;
use supportdesk_core::types::{Message, MessageSlice, NewMessage};

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, encode_ts, message_from_row, now};

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Insert one message row and return its sequence number.
pub(crate) fn insert_message_row(
    conn: &rusqlite::Connection,
    message: &Message,
) -> Result<i64, rusqlite::Error> {
    let file_ids = serde_json::to_string(&message.file_ids)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO messages (id, conversation_id, sender_id, content, is_internal_note, \
         file_ids, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            message.id,
            message.conversation_id,
            message.sender_id,
            message.content,
            message.is_internal_note,
            file_ids,
            encode_ts(&message.created_at),
            encode_ts(&message.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a message to an existing conversation.
///
/// A public message also moves the conversation's `last_message_at` and
/// `updated_at`. Internal notes leave the conversation row untouched.
pub async fn append_message(db: &Database, input: NewMessage) -> Result<Message, SupportError> {
    let id = uuid::Uuid::now_v7().to_string();
    let proposed = now();
    db.connection()
        .call(move |conn| -> Result<Message, rusqlite::Error> {
            let tx = conn.transaction()?;
            let newest: Option<String> = tx.query_row(
                "SELECT MAX(created_at) FROM messages WHERE conversation_id = ?1",
                params![input.conversation_id],
                |row| row.get(0),
            )?;
            let created_at = match newest {
                Some(raw) => {
                    let newest = chrono::DateTime::parse_from_rfc3339(&raw)
                        .map(|ts| ts.with_timezone(&chrono::Utc))
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                0,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?;
                    proposed.max(newest)
                }
                None => proposed,
            };

            let mut message = Message {
                id,
                conversation_id: input.conversation_id,
                sender_id: input.sender_id,
                content: input.content,
                is_internal_note: input.is_internal_note,
                file_ids: input.file_ids,
                created_at,
                updated_at: created_at,
                sequence: 0,
            };
            message.sequence = insert_message_row(&tx, &message)?;

            if !message.is_internal_note {
                let stamp = encode_ts(&created_at);
                tx.execute(
                    "UPDATE conversations SET last_message_at = MAX(last_message_at, ?2), \
                     updated_at = MAX(updated_at, ?2) WHERE id = ?1",
                    params![message.conversation_id, stamp],
                )?;
            }
            tx.commit()?;
            Ok(message)
        })
        .await
        .map_err(map_tr_err)
}

/// One page of the log plus the visible total, read in one transaction.
pub async fn page_messages(
    db: &Database,
    conversation_id: &str,
    include_internal: bool,
    offset: u64,
    limit: u64,
) -> Result<MessageSlice, SupportError> {
    let conversation_id = conversation_id.to_string();
    let offset = to_sql_int(offset);
    let limit = to_sql_int(limit);
    db.connection()
        .call(move |conn| -> Result<MessageSlice, rusqlite::Error> {
            let tx = conn.transaction()?;
            let total: i64 = tx.query_row(
                "SELECT COUNT(*) FROM messages \
                 WHERE conversation_id = ?1 AND (?2 OR is_internal_note = 0)",
                params![conversation_id, include_internal],
                |row| row.get(0),
            )?;
            let messages = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages \
                     WHERE conversation_id = ?1 AND (?2 OR is_internal_note = 0) \
                     ORDER BY created_at ASC, seq ASC LIMIT ?3 OFFSET ?4"
                ))?;
                let rows = stmt.query_map(
                    params![conversation_id, include_internal, limit, offset],
                    message_from_row,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            tx.commit()?;
            Ok(MessageSlice {
                messages,
                total: u64::try_from(total).unwrap_or_default(),
            })
        })
        .await
        .map_err(map_tr_err)
}

pub(crate) fn latest_message(
    conn: &rusqlite::Connection,
    conversation_id: &str,
    include_internal: bool,
) -> Result<Option<Message>, rusqlite::Error> {
    conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = ?1 AND (?2 OR is_internal_note = 0) \
             ORDER BY created_at DESC, seq DESC LIMIT 1"
        ),
        params![conversation_id, include_internal],
        message_from_row,
    )
    .optional()
}

/// Latest message visible under `include_internal`.
pub async fn last_message(
    db: &Database,
    conversation_id: &str,
    include_internal: bool,
) -> Result<Option<Message>, SupportError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            latest_message(conn, &conversation_id, include_internal)
        })
        .await
        .map_err(map_tr_err)
}
