// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider sender for deterministic testing.
//!
//! Outcomes are popped from a FIFO script. When the script is empty the send
//! succeeds with a generated `wamid.mock-N` id.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::time::Instant;
use wagate_core::{
    AdapterType, GatewayError, HealthStatus, MessageSender, OutboundContent, PluginAdapter,
    SendReceipt,
};

use crate::call_log::CallLog;

/// One recorded send.
#[derive(Debug, Clone)]
pub struct SentCall {
    pub to: String,
    pub content: OutboundContent,
    /// Tokio time, so paused-clock tests can measure retry gaps.
    pub at: Instant,
}

/// Scripted outcome.
#[derive(Debug, Clone)]
enum Outcome {
    Accept(String),
    Reject { status: u16, body: String },
}

/// A sender that never touches the network.
#[derive(Debug, Default)]
pub struct MockSender {
    script: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<SentCall>>,
    next_id: AtomicU64,
    log: Option<CallLog>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record each send as `"send"` in `log`.
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    /// Queue `n` rejections with the given HTTP status.
    pub fn fail_next(&self, n: usize, status: u16) {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..n {
            script.push_back(Outcome::Reject {
                status,
                body: format!("{{\"error\":{{\"code\":{status}}}}}"),
            });
        }
    }

    /// Queue a success with a fixed provider id.
    pub fn accept_with_id(&self, wa_message_id: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Outcome::Accept(wa_message_id.into()));
    }

    pub fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl PluginAdapter for MockSender {
    fn name(&self) -> &str {
        "mock-sender"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send_message(
        &self,
        to: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt, GatewayError> {
        if let Some(log) = &self.log {
            log.record("send");
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentCall {
                to: to.to_string(),
                content: content.clone(),
                at: Instant::now(),
            });

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match outcome {
            Some(Outcome::Reject { status, body }) => Err(GatewayError::ProviderSend { status, body }),
            Some(Outcome::Accept(id)) => Ok(SendReceipt { wa_message_id: id }),
            None => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(SendReceipt {
                    wa_message_id: format!("wamid.mock-{n}"),
                })
            }
        }
    }
}
