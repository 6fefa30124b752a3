// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket realtime transport.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "subscribe", "conversationId": "..."}
//! {"type": "unsubscribe", "conversationId": "..."}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "subscribed", "conversationId": "..."}
//! {"type": "unsubscribed", "conversationId": "..."}
//! {"type": "message_created", "conversationId": "...", "message": {...}}
//! {"type": "error", "code": "AUTHORIZATION_ERROR", "error": "..."}
//! ```
//!
//! The caller authenticates during the handshake. Every subscription goes
//! through the same gate as a message read, and all of them are dropped when
//! the socket closes.

use std::collections::HashMap;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use supportdesk_chat::{RealtimeEvent, SessionHandle};
use supportdesk_core::SupportError;

use crate::auth;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Frame sent by the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    #[serde(rename_all = "camelCase")]
    Subscribe { conversation_id: String },
    #[serde(rename_all = "camelCase")]
    Unsubscribe { conversation_id: String },
}

/// Control frame sent by the server. Message events use [`RealtimeEvent`].
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    Subscribed { conversation_id: String },
    #[serde(rename_all = "camelCase")]
    Unsubscribed { conversation_id: String },
    Error { code: &'static str, error: String },
}

impl ServerFrame {
    fn from_error(err: &SupportError) -> Self {
        ServerFrame::Error {
            code: err.code(),
            error: err.public_message(),
        }
    }
}

/// WebSocket upgrade handler.
///
/// Authentication failures are rejected with 401 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let session = match auth::authenticate(&state, &headers, &query).await {
        Ok(identity) => state.chat.open_session(identity),
        Err(e) => Err(e),
    };
    match session {
        Ok((session, events)) => {
            ws.on_upgrade(move |socket| handle_socket(socket, state, session, events))
        }
        Err(e) => ApiError(e).into_response(),
    }
}

/// Handle an individual WebSocket connection.
///
/// A sender task forwards realtime events and control replies to the socket
/// while the receive loop handles subscribe/unsubscribe frames.
async fn handle_socket(
    socket: WebSocket,
    state: GatewayState,
    session: SessionHandle,
    mut events: mpsc::Receiver<RealtimeEvent>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(16);
    let session_id = session.id();
    tracing::debug!(session_id, user_id = %session.identity().id, "websocket connected");

    let sender_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                Some(reply) = reply_rx.recv() => reply,
                Some(event) = events.recv() => match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(session_id, error = %e, "failed to encode realtime event");
                        continue;
                    }
                },
                else => break,
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let reply = handle_frame(&state, &session, text.as_str()).await;
                let Ok(json) = serde_json::to_string(&reply) else {
                    continue;
                };
                if reply_tx.send(json).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by tungstenite layer)
        }
    }

    // Cleanup. Dropping the handle removes every subscription.
    drop(session);
    sender_task.abort();
    tracing::debug!(session_id, "websocket disconnected");
}

async fn handle_frame(state: &GatewayState, session: &SessionHandle, text: &str) -> ServerFrame {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(session_id = session.id(), "invalid websocket frame: {e}");
            return ServerFrame::from_error(&SupportError::Validation {
                field: None,
                message: "frame must be a subscribe or unsubscribe request".into(),
            });
        }
    };
    match frame {
        ClientFrame::Subscribe { conversation_id } => {
            match state.chat.subscribe(session, &conversation_id).await {
                Ok(()) => ServerFrame::Subscribed { conversation_id },
                Err(e) => ServerFrame::from_error(&e),
            }
        }
        ClientFrame::Unsubscribe { conversation_id } => {
            state.chat.unsubscribe(session, &conversation_id);
            ServerFrame::Unsubscribed { conversation_id }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_deserialize() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"subscribe","conversationId":"c-1"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Subscribe { conversation_id } if conversation_id == "c-1"));

        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"unsubscribe","conversationId":"c-2"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Unsubscribe { conversation_id } if conversation_id == "c-2"));

        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"publish"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn server_frames_serialize() {
        let json = serde_json::to_value(ServerFrame::Subscribed {
            conversation_id: "c-1".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "subscribed", "conversationId": "c-1"}));

        let json = serde_json::to_value(ServerFrame::from_error(&SupportError::Authorization)).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "AUTHORIZATION_ERROR");
    }
}
