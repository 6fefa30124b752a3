// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static identity provider.
//!
//! Resolves bearer tokens against identities provisioned in configuration.
//! Only SHA-256 digests of tokens are held; presented tokens are hashed and
//! looked up by digest.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use supportdesk_config::model::IdentityConfig;
use supportdesk_core::types::{AdapterType, HealthStatus, Identity};
use supportdesk_core::{IdentityProvider, PluginAdapter, SupportError};

/// Lowercase hex SHA-256 of a bearer token, as stored in `token_sha256`.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Identity provider over a fixed set of configured identities.
pub struct StaticIdentityProvider {
    by_token: HashMap<String, String>,
    users: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new(identities: &[IdentityConfig]) -> Self {
        let mut by_token = HashMap::with_capacity(identities.len());
        let mut users = HashMap::with_capacity(identities.len());
        for entry in identities {
            by_token.insert(entry.token_sha256.to_ascii_lowercase(), entry.user_id.clone());
            users.insert(
                entry.user_id.clone(),
                Identity {
                    id: entry.user_id.clone(),
                    role: entry.role,
                    is_active: entry.active,
                },
            );
        }
        debug!(count = users.len(), "static identities loaded");
        Self { by_token, users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for StaticIdentityProvider {
    fn name(&self) -> &str {
        "static-identity"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, SupportError> {
        if self.users.is_empty() {
            Ok(HealthStatus::Degraded("no identities configured".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), SupportError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, SupportError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .by_token
            .get(&hash_token(token))
            .and_then(|user_id| self.users.get(user_id))
            .cloned())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<Identity>, SupportError> {
        Ok(self.users.get(user_id).cloned())
    }
}
