// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Supportdesk messaging core.
//!
//! Provides the error type, the domain types (conversations, messages,
//! identities), and the adapter traits every backend implements.

pub mod error;
pub mod traits;
pub mod types;

pub use error::SupportError;
pub use types::{AdapterType, HealthStatus, Identity, Role};

pub use traits::{ConversationStore, IdentityProvider, MessageStore, PluginAdapter, StorageAdapter};
