// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring counter store used for rate-limit buckets.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::traits::adapter::PluginAdapter;

/// Atomic increment-with-expiry over string keys.
#[async_trait]
pub trait CounterStore: PluginAdapter {
    /// Increments `key` and returns the new count.
    ///
    /// The expiry is set only when the increment creates the key; later
    /// increments within the same lifetime never extend it.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, GatewayError>;
}
