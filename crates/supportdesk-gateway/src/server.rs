// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use supportdesk_chat::ChatService;
use supportdesk_core::SupportError;

use crate::auth::auth_middleware;
use crate::{handlers, sse, ws};

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub chat: ChatService,
    pub health: HealthState,
}

/// Address the gateway binds to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the full router.
///
/// - GET /health, GET /metrics (public)
/// - /conversations REST routes (bearer auth via middleware)
/// - GET /ws, GET /conversations/{id}/events (auth during handshake,
///   header or `?token=`)
/// - unknown paths answer 404 and unsupported methods 405, both with the
///   JSON error body
pub fn build_router(state: GatewayState) -> Router {
    // Unauthenticated public routes (health + metrics for systemd and Prometheus).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::get_conversation).patch(handlers::update_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::list_messages).post(handlers::create_message),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Realtime routes authenticate themselves so browsers can pass ?token=.
    let realtime_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/conversations/{id}/events", get(sse::stream_conversation))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(realtime_routes)
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), SupportError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SupportError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SupportError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header::AUTHORIZATION};
    use serde_json::{Value, json};
    use supportdesk_auth::{StaticIdentityProvider, hash_token};
    use supportdesk_config::IdentityConfig;
    use supportdesk_config::model::StorageConfig;
    use supportdesk_core::{Role, StorageAdapter};
    use supportdesk_storage::SqliteStorage;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    fn identity(user_id: &str, role: Role) -> IdentityConfig {
        IdentityConfig {
            user_id: user_id.into(),
            role,
            token_sha256: hash_token(&format!("{user_id}-token")),
            active: true,
            display_name: None,
        }
    }

    async fn app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("gateway.db").display().to_string(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        let identities = StaticIdentityProvider::new(&[
            identity("client-a", Role::Client),
            identity("agent", Role::Team),
        ]);
        let chat = ChatService::new(
            Arc::new(storage),
            Arc::new(identities),
            Default::default(),
        );
        let state = GatewayState {
            chat,
            health: HealthState::new(Some(Arc::new(|| "# metrics\n".to_string()))),
        };
        (build_router(state), dir)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_and_metrics_are_public() {
        let (app, _dir) = app().await;
        let response = app.clone().oneshot(request("GET", "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");

        let response = app.oneshot(request("GET", "/metrics", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"# metrics\n");
    }

    #[tokio::test]
    async fn conversation_routes_require_auth() {
        let (app, _dir) = app().await;
        for token in [None, Some("nope")] {
            let response = app
                .clone()
                .oneshot(request("GET", "/conversations", token, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = json_body(response).await;
            assert_eq!(body["code"], "AUTHENTICATION_ERROR");
        }
    }

    #[tokio::test]
    async fn create_and_fetch_conversation() {
        let (app, _dir) = app().await;
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/conversations",
                Some("client-a-token"),
                Some(json!({"subject": "Help", "message": "I need help"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["conversation"]["status"], "open");
        assert_eq!(body["message"]["content"], "I need help");
        let id = body["conversation"]["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request("GET", &format!("/conversations/{id}"), Some("agent-token"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["conversation"]["subject"], "Help");
        assert_eq!(body["conversation"]["lastMessage"]["content"], "I need help");
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (app, _dir) = app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/conversations")
                    .header(AUTHORIZATION, "Bearer client-a-token")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"subject\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_routes_use_the_error_envelope() {
        let (app, _dir) = app().await;
        let response = app
            .clone()
            .oneshot(request("GET", "/nope", Some("agent-token"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "route not found");
        assert!(body["timestamp"].is_string());

        let response = app
            .oneshot(request("GET", "/conversations/x/messages/y", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unsupported_methods_use_the_error_envelope() {
        let (app, _dir) = app().await;
        for (method, uri) in [
            ("DELETE", "/conversations/abc"),
            ("PUT", "/conversations"),
            ("POST", "/health"),
        ] {
            let response = app
                .clone()
                .oneshot(request(method, uri, Some("agent-token"), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            let body = json_body(response).await;
            assert_eq!(body["code"], "VALIDATION_ERROR");
            assert_eq!(body["error"], "method not allowed");
        }
    }

    #[tokio::test]
    async fn realtime_routes_reject_unauthenticated() {
        let (app, _dir) = app().await;
        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/conversations/00000000-0000-4000-8000-000000000000/events",
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(request(
                "GET",
                "/conversations/00000000-0000-4000-8000-000000000000/events?token=agent-token",
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
