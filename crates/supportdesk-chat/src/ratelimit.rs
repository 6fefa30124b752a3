// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender message-creation quota.
//!
//! An exact rolling window: each sender keeps the instants of its accepted
//! messages from the last `window`, and a new message is accepted only while
//! fewer than `messages` remain.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use supportdesk_config::ChatConfig;
use supportdesk_core::SupportError;

pub struct MessageRateLimiter {
    limit: usize,
    window: Duration,
    senders: DashMap<String, VecDeque<Instant>>,
}

impl MessageRateLimiter {
    pub fn new(messages: u32, window: Duration) -> Self {
        Self {
            limit: messages.max(1) as usize,
            window,
            senders: DashMap::new(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.rate_limit_messages,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    fn evict(&self, sent: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = sent.front() {
            if now.duration_since(oldest) < self.window {
                break;
            }
            sent.pop_front();
        }
    }

    /// Consume one slot for `sender_id`, or report how long to wait.
    pub fn check(&self, sender_id: &str) -> Result<(), SupportError> {
        let now = Instant::now();
        let mut sent = self.senders.entry(sender_id.to_string()).or_default();
        self.evict(&mut sent, now);

        if sent.len() >= self.limit {
            let oldest = sent.front().copied().unwrap_or(now);
            supportdesk_prometheus::record_rate_limited();
            return Err(SupportError::RateLimited {
                retry_after: self.window.saturating_sub(now.duration_since(oldest)),
            });
        }
        sent.push_back(now);
        Ok(())
    }

    /// Forget senders with nothing left in the window.
    pub fn prune(&self) {
        let now = Instant::now();
        self.senders.retain(|_, sent| {
            self.evict(sent, now);
            !sent.is_empty()
        });
    }

    pub fn tracked_senders(&self) -> usize {
        self.senders.len()
    }
}
