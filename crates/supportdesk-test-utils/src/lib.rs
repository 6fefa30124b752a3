// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Supportdesk integration tests.
//!
//! [`TestHarness`] wires the whole stack (SQLite store on a temp file,
//! static identities, chat service, gateway router) so tests can drive it
//! over HTTP without binding a socket.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder, token_for};
