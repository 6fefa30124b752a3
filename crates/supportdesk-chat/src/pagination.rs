// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page parameters and page metadata for message listings.
//!
//! Query parameters never fail: unusable values fall back to defaults and
//! sizes are clamped to the configured range.

use std::num::IntErrorKind;

use serde::Serialize;
use supportdesk_config::ChatConfig;
use supportdesk_core::types::Message;

/// A normalized page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

enum Parsed {
    Missing,
    Value(i64),
}

fn parse(raw: Option<&str>) -> Parsed {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Parsed::Missing;
    };
    match raw.parse::<i64>() {
        Ok(n) => Parsed::Value(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Parsed::Value(i64::MAX),
            IntErrorKind::NegOverflow => Parsed::Value(i64::MIN),
            _ => Parsed::Missing,
        },
    }
}

impl PageRequest {
    /// Normalize raw query values.
    ///
    /// `page` becomes 1 unless it is a positive integer. `limit` takes the
    /// configured default unless it is an integer, and is then clamped to
    /// `1..=max_page_size`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, config: &ChatConfig) -> Self {
        let page = match parse(page) {
            Parsed::Value(n) if n >= 1 => n as u64,
            _ => 1,
        };
        let max = u64::from(config.max_page_size.max(1));
        let limit = match parse(limit) {
            Parsed::Value(n) if n < 1 => 1,
            Parsed::Value(n) => (n as u64).min(max),
            Parsed::Missing => u64::from(config.default_page_size).clamp(1, max),
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Page metadata returned next to each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// A page of messages as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}
