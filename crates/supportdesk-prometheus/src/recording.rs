// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers.
//!
//! Recording goes through the `metrics` facade, so these calls are no-ops
//! until a recorder is installed.

use metrics::{describe_counter, describe_gauge};

pub const MESSAGES_CREATED: &str = "supportdesk_messages_created_total";
pub const CONVERSATIONS_CREATED: &str = "supportdesk_conversations_created_total";
pub const RATE_LIMITED: &str = "supportdesk_rate_limited_total";
pub const BROADCAST_DROPPED: &str = "supportdesk_broadcast_dropped_total";
pub const REALTIME_SESSIONS: &str = "supportdesk_realtime_sessions";

/// Register metric descriptions. Call once after installing the recorder.
pub fn register_metrics() {
    describe_counter!(MESSAGES_CREATED, "Messages persisted, labelled by kind");
    describe_counter!(CONVERSATIONS_CREATED, "Conversations opened by clients");
    describe_counter!(RATE_LIMITED, "Message creates rejected by the rate limiter");
    describe_counter!(
        BROADCAST_DROPPED,
        "Realtime events dropped because a session queue was full or closed"
    );
    describe_gauge!(REALTIME_SESSIONS, "Open realtime sessions");
}

/// Count a persisted message. `kind` is `public` or `internal_note`.
pub fn record_message_created(internal_note: bool) {
    let kind = if internal_note { "internal_note" } else { "public" };
    metrics::counter!(MESSAGES_CREATED, "kind" => kind).increment(1);
}

pub fn record_conversation_created() {
    metrics::counter!(CONVERSATIONS_CREATED).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!(RATE_LIMITED).increment(1);
}

pub fn record_broadcast_dropped() {
    metrics::counter!(BROADCAST_DROPPED).increment(1);
}

pub fn set_realtime_sessions(count: usize) {
    metrics::gauge!(REALTIME_SESSIONS).set(count as f64);
}
