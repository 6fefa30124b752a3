// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket/SSE gateway for the conversation service.
//!
//! Handlers are thin: they authenticate, decode the request, call
//! [`supportdesk_chat::ChatService`], and map [`supportdesk_core::SupportError`]
//! onto status codes through [`error::ApiError`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod sse;
pub mod ws;

pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
