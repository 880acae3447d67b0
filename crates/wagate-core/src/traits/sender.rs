// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound sender trait for messaging-provider integrations.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutboundContent, SendReceipt};

/// Delivers one message to the external provider.
///
/// Senders know nothing about rate limiting or persistence. A non-2xx
/// provider answer is reported as [`GatewayError::ProviderSend`].
#[async_trait]
pub trait MessageSender: PluginAdapter {
    async fn send_message(
        &self,
        to: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt, GatewayError>;
}
