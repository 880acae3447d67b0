// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-recipient, per-minute send limit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;
use wagate_core::{Clock, CounterStore, GatewayError};

/// Lifetime of one minute bucket.
pub const BUCKET_TTL: Duration = Duration::from_secs(60);

/// Counter key for `recipient` in the UTC minute containing `now`.
pub fn bucket_key(recipient: &str, now: DateTime<Utc>) -> String {
    format!("ratelimit:{recipient}:{}", now.format("%Y:%m:%d:%H:%M"))
}

/// Caps how many messages one recipient receives per UTC minute.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, per_minute: u32) -> Self {
        Self {
            store,
            clock,
            per_minute,
        }
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute
    }

    /// Count one send towards `recipient`'s current bucket.
    ///
    /// Fails with [`GatewayError::RateLimitExceeded`] once the count passes
    /// the limit. The caller must not send in that case.
    pub async fn enforce(&self, recipient: &str) -> Result<(), GatewayError> {
        let key = bucket_key(recipient, self.clock.now());
        let count = self.store.incr_with_expiry(&key, BUCKET_TTL).await?;
        if count > u64::from(self.per_minute) {
            warn!(
                recipient,
                count,
                limit = self.per_minute,
                "rate limit exceeded"
            );
            return Err(GatewayError::RateLimitExceeded {
                recipient: recipient.to_string(),
                limit: self.per_minute,
            });
        }
        Ok(())
    }
}
