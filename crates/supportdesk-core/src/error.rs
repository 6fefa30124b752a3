// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Supportdesk messaging core.

use std::time::Duration;

use thiserror::Error;

/// Message used for every authorization failure, regardless of cause.
///
/// Kept content-free so a denied caller learns nothing about the resource.
pub const FORBIDDEN_MESSAGE: &str = "you do not have permission to perform this action";

/// The primary error type used across stores, the chat service, and the gateway.
#[derive(Debug, Error)]
pub enum SupportError {
    /// Missing, unresolvable, or inactive identity.
    #[error("authentication required")]
    Authentication,

    /// Authenticated but not permitted. Always renders [`FORBIDDEN_MESSAGE`].
    #[error("{}", FORBIDDEN_MESSAGE)]
    Authorization,

    /// Malformed, out-of-range, or wrong-typed input.
    #[error("{message}")]
    Validation {
        /// Offending request field, when one can be named.
        field: Option<String>,
        message: String,
    },

    /// Structurally invalid or nonexistent resource.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Operation invalid for the entity's current state.
    #[error("{0}")]
    Conflict(String),

    /// Sender exceeded the message-creation quota.
    #[error("rate limit exceeded, retry in {}s", retry_after.as_secs().max(1))]
    RateLimited { retry_after: Duration },

    /// Storage backend errors (connection failure, query failure, corrupt row).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors detected after startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SupportError {
    /// Build a validation error naming the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SupportError::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Machine-readable error code carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            SupportError::Authentication => "AUTHENTICATION_ERROR",
            SupportError::Authorization => "AUTHORIZATION_ERROR",
            SupportError::Validation { .. } => "VALIDATION_ERROR",
            SupportError::NotFound { .. } => "NOT_FOUND",
            SupportError::Conflict(_) => "CONFLICT",
            SupportError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            SupportError::Storage { .. } | SupportError::Config(_) | SupportError::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Whether the error carries details that must never reach a caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SupportError::Storage { .. } | SupportError::Config(_) | SupportError::Internal(_)
        )
    }

    /// Human-readable message safe to return to any caller.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}
