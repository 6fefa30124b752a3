// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider trait. Identity issuance itself lives outside this system.

use async_trait::async_trait;

use crate::error::SupportError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Identity;

/// Resolves opaque request credentials to caller identities.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Resolve a bearer credential. `Ok(None)` means the credential is unknown.
    ///
    /// Inactive identities are returned as-is; callers decide how to treat them.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, SupportError>;

    /// Look up a user by id, e.g. to check that an assignee exists.
    async fn find_user(&self, user_id: &str) -> Result<Option<Identity>, SupportError>;
}
