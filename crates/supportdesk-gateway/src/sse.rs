// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events transport for a single conversation.
//!
//! `GET /conversations/{id}/events` subscribes once for the lifetime of the
//! stream. Event format:
//! ```text
//! event: message_created
//! data: {"type":"message_created","conversationId":"...","message":{...}}
//! ```

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};

use supportdesk_chat::RealtimeEvent;

use crate::auth;
use crate::error::ApiError;
use crate::server::GatewayState;

fn to_sse_event(event: &RealtimeEvent) -> Event {
    let name = match event {
        RealtimeEvent::MessageCreated { .. } => "message_created",
    };
    Event::default()
        .event(name)
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to encode realtime event");
            Event::default().comment("encoding error")
        })
}

/// Stream realtime events for one conversation.
///
/// Authorization runs before the stream opens, so a denied caller gets a
/// normal JSON error response. The session (and its subscription) is dropped
/// together with the stream when the client disconnects.
pub async fn stream_conversation(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let identity = auth::authenticate(&state, &headers, &query).await?;
    let (session, events) = state.chat.open_session(identity)?;
    state.chat.subscribe(&session, &id).await?;
    tracing::debug!(session_id = session.id(), conversation_id = %id, "sse stream opened");

    let stream = stream::unfold((session, events), |(session, mut events)| async move {
        let event = events.recv().await?;
        Some((Ok(to_sse_event(&event)), (session, events)))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
