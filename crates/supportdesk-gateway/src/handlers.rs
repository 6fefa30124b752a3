// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the conversation REST API.
//!
//! Bodies are taken as raw bytes so malformed JSON surfaces as a
//! `VALIDATION_ERROR` instead of axum's plain-text rejection.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use supportdesk_chat::{ConversationDetail, MessagePage, PageRequest};
use supportdesk_core::types::{Conversation, Message};
use supportdesk_core::{HealthStatus, Identity, SupportError};

use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationDetail>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse<T> {
    pub conversation: T,
}

#[derive(Debug, Serialize)]
pub struct CreatedConversationResponse {
    pub conversation: Conversation,
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: Message,
}

fn parse_body(body: &Bytes) -> Result<Value, SupportError> {
    serde_json::from_slice(body).map_err(|_| SupportError::Validation {
        field: None,
        message: "request body must be valid JSON".into(),
    })
}

/// GET /health
///
/// Unauthenticated. Reports 503 when the store is unhealthy so process
/// supervisors can act on it.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status) = match state.chat.health().await {
        HealthStatus::Healthy => (StatusCode::OK, "healthy".to_string()),
        HealthStatus::Degraded(reason) => (StatusCode::OK, format!("degraded: {reason}")),
        HealthStatus::Unhealthy(reason) => {
            tracing::warn!(%reason, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy".to_string())
        }
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
///
/// Prometheus text exposition. Empty when no exporter is installed.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    let body = state
        .health
        .prometheus_render
        .as_ref()
        .map(|render| render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// GET /conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ConversationListResponse>, ApiError> {
    let conversations = state
        .chat
        .list_conversations(&identity, query.get("status").map(String::as_str))
        .await?;
    Ok(Json(ConversationListResponse { conversations }))
}

/// GET /conversations/{id}
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse<ConversationDetail>>, ApiError> {
    let conversation = state.chat.get_conversation(&identity, &id).await?;
    Ok(Json(ConversationResponse { conversation }))
}

/// POST /conversations
pub async fn create_conversation(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedConversationResponse>), ApiError> {
    let body = parse_body(&body)?;
    let (conversation, message) = state.chat.create_conversation(&identity, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedConversationResponse {
            conversation,
            message,
        }),
    ))
}

/// PATCH /conversations/{id}
pub async fn update_conversation(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ConversationResponse<Conversation>>, ApiError> {
    let body = parse_body(&body)?;
    let conversation = state.chat.update_conversation(&identity, &id, &body).await?;
    Ok(Json(ConversationResponse { conversation }))
}

/// GET /conversations/{id}/messages?page=&limit=
pub async fn list_messages(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<MessagePage>, ApiError> {
    let request = PageRequest::from_raw(
        query.get("page").map(String::as_str),
        query.get("limit").map(String::as_str),
        state.chat.config(),
    );
    let page = state.chat.list_messages(&identity, &id, request).await?;
    Ok(Json(page))
}

/// POST /conversations/{id}/messages
pub async fn create_message(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let body = parse_body(&body)?;
    let message = state.chat.create_message(&identity, &id, &body).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Any path no route matches.
pub async fn route_not_found() -> ApiError {
    ApiError(SupportError::NotFound { resource: "route" })
}

/// A known path hit with a method it does not serve.
pub async fn method_not_allowed() -> Response {
    let err = SupportError::Validation {
        field: None,
        message: "method not allowed".into(),
    };
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::from_error(&err)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = parse_body(&Bytes::from_static(b"{\"subject\":")).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(parse_body(&Bytes::new()).is_err());
        assert!(parse_body(&Bytes::from_static(b"{}")).is_ok());
    }

    #[test]
    fn health_response_is_camel_case() {
        let json = serde_json::to_value(HealthResponse {
            status: "healthy".into(),
            version: "0.1.0".into(),
            uptime_secs: 3,
        })
        .unwrap();
        assert_eq!(json["uptimeSecs"], 3);
    }
}
