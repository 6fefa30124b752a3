// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`SupportError`] to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use supportdesk_core::SupportError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description, never privileged.
    pub error: String,
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: &'static str,
    /// RFC 3339 timestamp of when the error was produced.
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_error(err: &SupportError) -> Self {
        Self {
            error: err.public_message(),
            code: err.code(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Handler error wrapper so `?` works on [`SupportError`] inside handlers.
#[derive(Debug)]
pub struct ApiError(pub SupportError);

impl From<SupportError> for ApiError {
    fn from(err: SupportError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(err: &SupportError) -> StatusCode {
    match err {
        SupportError::Authentication => StatusCode::UNAUTHORIZED,
        SupportError::Authorization => StatusCode::FORBIDDEN,
        SupportError::Validation { .. } | SupportError::Conflict(_) => StatusCode::BAD_REQUEST,
        SupportError::NotFound { .. } => StatusCode::NOT_FOUND,
        SupportError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        SupportError::Storage { .. } | SupportError::Config(_) | SupportError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_internal() {
            tracing::error!(error = %err, "request failed");
        }
        let status = status_for(&err);
        let body = ErrorResponse::from_error(&err);

        if let SupportError::RateLimited { retry_after } = &err {
            let secs = retry_after.as_secs().max(1).to_string();
            return (status, [("retry-after", secs)], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}
