// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-stack test harness.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE};
use serde_json::Value;
use tower::ServiceExt;

use supportdesk_auth::{StaticIdentityProvider, hash_token};
use supportdesk_chat::ChatService;
use supportdesk_config::IdentityConfig;
use supportdesk_config::model::{ChatConfig, StorageConfig};
use supportdesk_core::{Role, StorageAdapter, SupportError};
use supportdesk_gateway::{GatewayState, HealthState, build_router};
use supportdesk_storage::SqliteStorage;

/// The bearer token the harness issues to `user_id`.
pub fn token_for(user_id: &str) -> String {
    format!("{user_id}-token")
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    identities: Vec<(String, Role, bool)>,
    chat: ChatConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            identities: Vec::new(),
            chat: ChatConfig::default(),
        }
    }

    /// Register an active identity whose token is [`token_for`]`(user_id)`.
    pub fn with_identity(mut self, user_id: &str, role: Role) -> Self {
        self.identities.push((user_id.to_string(), role, true));
        self
    }

    /// Register a deactivated identity.
    pub fn with_inactive_identity(mut self, user_id: &str, role: Role) -> Self {
        self.identities.push((user_id.to_string(), role, false));
        self
    }

    /// Two clients, a team member, an admin, and a deactivated team member.
    pub fn with_default_identities(self) -> Self {
        self.with_identity("client-a", Role::Client)
            .with_identity("client-b", Role::Client)
            .with_identity("agent", Role::Team)
            .with_identity("admin", Role::Admin)
            .with_inactive_identity("retired", Role::Team)
    }

    pub fn with_chat_config(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SupportError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SupportError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let identities: Vec<IdentityConfig> = self
            .identities
            .into_iter()
            .map(|(user_id, role, active)| IdentityConfig {
                token_sha256: hash_token(&token_for(&user_id)),
                user_id,
                role,
                active,
                display_name: None,
            })
            .collect();
        let provider = Arc::new(StaticIdentityProvider::new(&identities));

        let chat = ChatService::new(storage.clone(), provider, self.chat);
        let router = build_router(GatewayState {
            chat: chat.clone(),
            health: HealthState::new(None),
        });
        tracing::debug!(path = %db_path.display(), "test harness ready");

        Ok(TestHarness {
            chat,
            router,
            storage,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete stack on a temporary database. Dropping it deletes the database.
pub struct TestHarness {
    pub chat: ChatService,
    pub router: Router,
    pub storage: Arc<dyn StorageAdapter>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with [`TestHarnessBuilder::with_default_identities`].
    pub async fn new() -> Result<Self, SupportError> {
        Self::builder().with_default_identities().build().await
    }

    /// Send one request through the router as `user` and decode the JSON body.
    ///
    /// `user` is a user id; `None` sends no `Authorization` header. Empty
    /// bodies decode to `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token_for(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(user), Some(body)).await
    }

    /// Open a conversation as `client` and return its id.
    pub async fn open_conversation(&self, client: &str, subject: &str, message: &str) -> String {
        let (status, body) = self
            .post(
                "/conversations",
                client,
                serde_json::json!({"subject": subject, "message": message}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["conversation"]["id"]
            .as_str()
            .expect("conversation id")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_serves_requests() {
        let harness = TestHarness::new().await.unwrap();
        let (status, body) = harness.get("/conversations", "client-a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversations"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn inactive_identity_is_rejected() {
        let harness = TestHarness::new().await.unwrap();
        let (status, body) = harness.get("/conversations", "retired").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTHENTICATION_ERROR");
    }
}
