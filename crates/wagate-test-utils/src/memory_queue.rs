// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory stand-in for a managed queue.
//!
//! Received messages become invisible until deleted or released with
//! [`MemoryQueueBackend::expire_visibility`], mirroring a visibility timeout.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wagate_core::{
    AdapterType, GatewayError, HealthStatus, PluginAdapter, QueueBackend, ReceivedMessage,
};

#[derive(Debug, Default)]
struct State {
    visible: VecDeque<(String, String)>,
    in_flight: BTreeMap<String, String>,
    deleted: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryQueueBackend {
    state: Mutex<State>,
    next_handle: AtomicU64,
    fail_next_receive: AtomicBool,
}

impl MemoryQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies waiting to be received.
    pub fn visible(&self) -> Vec<String> {
        self.lock().visible.iter().map(|(_, b)| b.clone()).collect()
    }

    /// Bodies received but neither deleted nor released.
    pub fn in_flight(&self) -> Vec<String> {
        self.lock().in_flight.values().cloned().collect()
    }

    /// Receipt handles deleted so far.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    /// Return every in-flight message to the visible queue.
    pub fn expire_visibility(&self) {
        let mut state = self.lock();
        let released = std::mem::take(&mut state.in_flight);
        state.visible.extend(released);
    }

    /// Make the next `receive` fail once.
    pub fn fail_next_receive(&self) {
        self.fail_next_receive.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PluginAdapter for MemoryQueueBackend {
    fn name(&self) -> &str {
        "memory-queue"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Queue
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl QueueBackend for MemoryQueueBackend {
    async fn send(&self, body: String) -> Result<(), GatewayError> {
        let handle = format!("rh-{}", self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock().visible.push_back((handle, body));
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: i32,
        _wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, GatewayError> {
        if self.fail_next_receive.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Queue {
                message: "injected receive failure".into(),
                source: None,
            });
        }
        let mut state = self.lock();
        let take = usize::try_from(max_messages.max(0)).unwrap_or(0);
        let mut out = Vec::new();
        while out.len() < take {
            let Some((handle, body)) = state.visible.pop_front() else {
                break;
            };
            state.in_flight.insert(handle.clone(), body.clone());
            out.push(ReceivedMessage {
                receipt_handle: handle,
                body,
            });
        }
        Ok(out)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.in_flight.remove(receipt_handle).is_none() {
            return Err(GatewayError::Queue {
                message: format!("unknown receipt handle {receipt_handle}"),
                source: None,
            });
        }
        state.deleted.push(receipt_handle.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_hides_until_delete_or_expiry() {
        let queue = MemoryQueueBackend::new();
        queue.send("a".into()).await.unwrap();
        queue.send("b".into()).await.unwrap();

        let got = queue.receive(1, Duration::ZERO).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(queue.visible(), vec!["b"]);

        queue.delete(&got[0].receipt_handle).await.unwrap();
        let second = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(second.len(), 1);
        queue.expire_visibility();
        assert_eq!(queue.visible(), vec!["b"]);
        assert_eq!(queue.deleted().len(), 1);
    }
}
