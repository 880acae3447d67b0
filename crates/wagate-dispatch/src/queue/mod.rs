// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery queues.
//!
//! The mode is chosen once at startup: [`LocalRetryQueue`] retries in
//! process with a fixed backoff, [`ManagedQueue`] hands requests to a managed
//! queue and leaves retries to its redrive policy.

pub mod local;
pub mod managed;
pub mod sqs;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wagate_config::QueueMode;
use wagate_config::model::QueueConfig;
use wagate_core::{GatewayError, OutboundRequest, QueueBackend};

use crate::pipeline::SendPipeline;

pub use local::{BACKOFF, DeliveryEvent, DeliveryState, LocalRetryQueue, MAX_RETRIES};
pub use managed::{ManagedQueue, ManagedQueueSettings, PollReport, poll_once, process_batch};
pub use sqs::SqsBackend;

/// Entry point for outbound requests.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Accept a request for delivery. Returns once it is queued, not sent.
    async fn enqueue_send(&self, request: OutboundRequest) -> Result<(), GatewayError>;

    fn mode(&self) -> QueueMode;

    /// Stop background work and wait for it to finish.
    async fn shutdown(&self);
}

/// Build the queue selected by `config.mode`.
pub async fn build_queue(
    config: &QueueConfig,
    pipeline: Arc<dyn SendPipeline>,
    cancel: CancellationToken,
) -> Result<Arc<dyn DeliveryQueue>, GatewayError> {
    match config.mode {
        QueueMode::Local => Ok(Arc::new(LocalRetryQueue::spawn(pipeline, cancel))),
        QueueMode::Sqs => {
            let url = config.sqs_queue_url.clone().ok_or_else(|| {
                GatewayError::Config("queue.sqs_queue_url is required in sqs mode".into())
            })?;
            let backend: Arc<dyn QueueBackend> =
                Arc::new(SqsBackend::connect(url, config.aws_region.clone()).await);
            Ok(Arc::new(ManagedQueue::spawn(
                backend,
                pipeline,
                ManagedQueueSettings::from(config),
                cancel,
            )))
        }
    }
}
