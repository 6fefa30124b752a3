// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types.
//!
//! Timestamps are stored as fixed-width RFC 3339 text with microsecond
//! precision and a `Z` suffix, so lexical order equals chronological order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use supportdesk_core::types::{Conversation, ConversationStatus, Message, Priority};

pub(crate) const CONVERSATION_COLUMNS: &str = "id, client_id, subject, status, priority, \
     assigned_to, last_message_at, created_at, updated_at";

pub(crate) const MESSAGE_COLUMNS: &str = "seq, id, conversation_id, sender_id, content, \
     is_internal_note, file_ids, created_at, updated_at";

/// Current time at storage precision.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

/// Map a row selected with [`CONVERSATION_COLUMNS`].
pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        client_id: row.get(1)?,
        subject: row.get(2)?,
        status: parsed_at::<ConversationStatus>(row, 3)?,
        priority: parsed_at::<Priority>(row, 4)?,
        assigned_to: row.get(5)?,
        last_message_at: ts_at(row, 6)?,
        created_at: ts_at(row, 7)?,
        updated_at: ts_at(row, 8)?,
    })
}

/// Map a row selected with [`MESSAGE_COLUMNS`].
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let file_ids: String = row.get(6)?;
    Ok(Message {
        sequence: row.get(0)?,
        id: row.get(1)?,
        conversation_id: row.get(2)?,
        sender_id: row.get(3)?,
        content: row.get(4)?,
        is_internal_note: row.get(5)?,
        file_ids: serde_json::from_str(&file_ids).map_err(|e| conversion_err(6, e))?,
        created_at: ts_at(row, 7)?,
        updated_at: ts_at(row, 8)?,
    })
}
