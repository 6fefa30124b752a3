// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for conversations and their message logs.
//!
//! WAL-mode SQLite with embedded migrations, a single writer thread via
//! `tokio-rusqlite`, and typed queries behind the core storage traits.

pub mod adapter;
pub mod database;
pub mod migrations;
pub(crate) mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
