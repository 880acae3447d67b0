// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distributed delivery through a managed queue.
//!
//! Requests are serialized onto the queue and consumed by one poll loop per
//! process. A message is deleted once it was sent and recorded, or once its
//! failure is not retryable (see [`GatewayError::is_retryable`]); a send that
//! succeeded but was not recorded is never redelivered. Transient failures
//! and undecodable bodies are left for the visibility timeout and redrive
//! policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wagate_config::QueueMode;
use wagate_config::model::QueueConfig;
use wagate_core::{GatewayError, OutboundRequest, PluginAdapter, QueueBackend, ReceivedMessage};

use super::DeliveryQueue;
use crate::pipeline::SendPipeline;

/// Poll loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedQueueSettings {
    pub max_messages: i32,
    pub wait: Duration,
    pub poll_interval: Duration,
}

impl From<&QueueConfig> for ManagedQueueSettings {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_messages: config.sqs_max_messages,
            wait: Duration::from_secs(config.sqs_wait_time_secs),
            poll_interval: Duration::from_millis(config.sqs_poll_interval_ms),
        }
    }
}

/// Outcome counts for one receive batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub received: usize,
    pub delivered: usize,
    /// Permanent failures removed from the queue.
    pub discarded: usize,
    pub left_for_redrive: usize,
}

/// Distributed-mode queue.
pub struct ManagedQueue {
    backend: Arc<dyn QueueBackend>,
    cancel: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl ManagedQueue {
    /// Start the consumer loop.
    pub fn spawn(
        backend: Arc<dyn QueueBackend>,
        pipeline: Arc<dyn SendPipeline>,
        settings: ManagedQueueSettings,
        cancel: CancellationToken,
    ) -> Self {
        let cancel = cancel.child_token();
        let handle = tokio::spawn(consume(
            backend.clone(),
            pipeline,
            settings,
            cancel.clone(),
        ));
        Self {
            backend,
            cancel,
            consumer: Mutex::new(Some(handle)),
        }
    }
}

#[async_trait]
impl DeliveryQueue for ManagedQueue {
    async fn enqueue_send(&self, request: OutboundRequest) -> Result<(), GatewayError> {
        let body = serde_json::to_string(&request)
            .map_err(|e| GatewayError::Internal(format!("failed to encode request: {e}")))?;
        self.backend.send(body).await?;
        debug!(to = %request.to, "outbound request pushed to managed queue");
        Ok(())
    }

    fn mode(&self) -> QueueMode {
        QueueMode::Sqs
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.consumer.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "managed queue consumer panicked");
            }
        }
    }
}

async fn consume(
    backend: Arc<dyn QueueBackend>,
    pipeline: Arc<dyn SendPipeline>,
    settings: ManagedQueueSettings,
    cancel: CancellationToken,
) {
    info!(backend = backend.name(), "managed queue consumer started");
    loop {
        // Only the receive races shutdown. A received batch always runs to
        // completion.
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            result = backend.receive(settings.max_messages, settings.wait) => result,
        };
        match received {
            Ok(messages) => {
                process_batch(backend.as_ref(), pipeline.as_ref(), messages).await;
            }
            Err(e) => error!(error = %e, "queue poll failed"),
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(settings.poll_interval) => {}
        }
    }
    info!("managed queue consumer stopped");
}

/// Receive one batch and process it.
///
/// Only the receive itself can fail; per-message failures are logged and
/// counted.
pub async fn poll_once(
    backend: &dyn QueueBackend,
    pipeline: &dyn SendPipeline,
    settings: &ManagedQueueSettings,
) -> Result<PollReport, GatewayError> {
    let messages = backend.receive(settings.max_messages, settings.wait).await?;
    Ok(process_batch(backend, pipeline, messages).await)
}

/// Run every message of a received batch through the pipeline.
pub async fn process_batch(
    backend: &dyn QueueBackend,
    pipeline: &dyn SendPipeline,
    messages: Vec<ReceivedMessage>,
) -> PollReport {
    let mut report = PollReport {
        received: messages.len(),
        ..PollReport::default()
    };

    for message in &messages {
        match process(backend, pipeline, message).await {
            Outcome::Delivered => report.delivered += 1,
            Outcome::Discarded => report.discarded += 1,
            Outcome::LeftForRedrive => report.left_for_redrive += 1,
        }
    }
    if report.received > 0 {
        debug!(
            received = report.received,
            delivered = report.delivered,
            discarded = report.discarded,
            left = report.left_for_redrive,
            "queue batch processed"
        );
    }
    report
}

enum Outcome {
    Delivered,
    Discarded,
    LeftForRedrive,
}

async fn process(
    backend: &dyn QueueBackend,
    pipeline: &dyn SendPipeline,
    message: &ReceivedMessage,
) -> Outcome {
    let request: OutboundRequest = match serde_json::from_str(&message.body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "undecodable queue message left for redrive");
            return Outcome::LeftForRedrive;
        }
    };

    match pipeline.send_and_persist(&request).await {
        Ok(wa_message_id) => {
            if let Err(e) = backend.delete(&message.receipt_handle).await {
                // Redelivery will send the message a second time.
                error!(wa_message_id = %wa_message_id, error = %e, "failed to delete delivered queue message");
            }
            Outcome::Delivered
        }
        Err(e) if e.is_retryable() => {
            warn!(to = %request.to, error = %e, "queued delivery failed, left for redrive");
            Outcome::LeftForRedrive
        }
        Err(e) => {
            match &e {
                GatewayError::SentNotRecorded { wa_message_id, .. } => {
                    error!(
                        to = %request.to,
                        wa_message_id = %wa_message_id,
                        error = %e,
                        "queued message sent but not recorded, removing it from the queue"
                    );
                }
                _ => warn!(to = %request.to, error = %e, "queued delivery failed permanently, removing it from the queue"),
            }
            if let Err(e) = backend.delete(&message.receipt_handle).await {
                error!(error = %e, "failed to delete permanently failed queue message");
            }
            Outcome::Discarded
        }
    }
}
