// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-to-staff support conversations.
//!
//! [`ChatService`] is the only entry point. It consults the authorization
//! gate ([`authz`]) for every operation, hides internal notes from clients
//! ([`visibility`]), pages the message log ([`pagination`]), validates and
//! sanitizes input ([`validation`], [`sanitize`]), limits message creation
//! per sender ([`ratelimit`]), and fans new messages out to realtime
//! sessions ([`broadcast`]).

pub mod authz;
pub mod broadcast;
pub mod pagination;
pub mod ratelimit;
pub mod sanitize;
pub mod service;
pub mod validation;
pub mod visibility;

pub use broadcast::{Broadcaster, RealtimeEvent, SessionHandle};
pub use pagination::{MessagePage, PageRequest, Pagination};
pub use service::{ChatService, ConversationDetail};
