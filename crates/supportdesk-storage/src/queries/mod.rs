// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over [`crate::Database`].

pub mod conversations;
pub mod messages;
