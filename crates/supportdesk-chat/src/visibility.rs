// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal notes are staff-only. Everything that leaves the service for a
//! caller (message pages, `lastMessage` summaries, realtime events) passes
//! through here.

use supportdesk_core::Role;
use supportdesk_core::types::{ConversationSummary, Message};

pub fn can_see_internal(role: Role) -> bool {
    role.is_staff()
}

pub fn visible_to(role: Role, message: &Message) -> bool {
    !message.is_internal_note || can_see_internal(role)
}

pub fn filter(role: Role, mut messages: Vec<Message>) -> Vec<Message> {
    messages.retain(|m| visible_to(role, m));
    messages
}

pub fn filter_summary(role: Role, mut summary: ConversationSummary) -> ConversationSummary {
    if summary
        .last_message
        .as_ref()
        .is_some_and(|m| !visible_to(role, m))
    {
        summary.last_message = None;
    }
    summary
}
