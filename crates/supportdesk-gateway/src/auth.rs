// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the gateway.
//!
//! REST routes authenticate through [`auth_middleware`], which resolves the
//! `Authorization: Bearer <token>` header to an [`Identity`] and stores it in
//! the request extensions. Realtime routes cannot always set headers, so they
//! call [`authenticate`] directly and additionally accept `?token=`.

use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use supportdesk_core::{Identity, SupportError};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from the header, falling back to a `token` query parameter.
pub async fn authenticate(
    state: &GatewayState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Identity, SupportError> {
    let token = bearer_token(headers).or_else(|| query.get("token").map(String::as_str));
    state.chat.authenticate(token).await
}

/// Middleware that rejects unauthenticated requests with 401.
///
/// Fails closed: a missing header, an unknown token, and an inactive identity
/// all produce the same response.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state
        .chat
        .authenticate(bearer_token(request.headers()))
        .await?;
    tracing::debug!(user_id = %identity.id, role = %identity.role, "request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_prefix_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer    "));
        assert_eq!(bearer_token(&headers), None);
    }
}
