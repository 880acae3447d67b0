// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for managed (distributed) queues.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::traits::adapter::PluginAdapter;

/// A message pulled from a managed queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Opaque handle used to delete the message after processing.
    pub receipt_handle: String,
    pub body: String,
}

/// Send, long-poll receive and delete against a managed queue.
///
/// Messages that are received but never deleted become visible again after
/// the backend's visibility timeout.
#[async_trait]
pub trait QueueBackend: PluginAdapter {
    async fn send(&self, body: String) -> Result<(), GatewayError>;

    async fn receive(
        &self,
        max_messages: i32,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, GatewayError>;

    async fn delete(&self, receipt_handle: &str) -> Result<(), GatewayError>;
}
