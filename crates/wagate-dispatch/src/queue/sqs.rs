// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AWS SQS transport for the managed queue.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use tracing::{info, warn};
use wagate_core::{AdapterType, GatewayError, HealthStatus, PluginAdapter, QueueBackend, ReceivedMessage};

/// Longest long-poll SQS accepts.
const MAX_WAIT_SECS: u64 = 20;

/// Queue backend talking to one SQS queue.
#[derive(Debug, Clone)]
pub struct SqsBackend {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsBackend {
    /// Load AWS credentials from the environment and bind to `queue_url`.
    pub async fn connect(queue_url: String, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = loader.load().await;
        info!(queue_url = %queue_url, "sqs queue backend configured");
        Self::from_client(aws_sdk_sqs::Client::new(&sdk_config), queue_url)
    }

    pub fn from_client(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

fn queue_err<E>(action: &str, e: E) -> GatewayError
where
    E: std::error::Error + Send + Sync + 'static,
{
    GatewayError::Queue {
        message: format!("sqs {action} failed: {}", DisplayErrorContext(&e)),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for SqsBackend {
    fn name(&self) -> &str {
        "sqs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Queue
    }

    /// Cheap round trip: read one queue attribute.
    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        let probe = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await;
        match probe {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => {
                warn!(queue_url = %self.queue_url, error = %DisplayErrorContext(&e), "sqs health check failed");
                Ok(HealthStatus::Unhealthy(format!(
                    "sqs get_queue_attributes failed: {}",
                    DisplayErrorContext(&e)
                )))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl QueueBackend for SqsBackend {
    async fn send(&self, body: String) -> Result<(), GatewayError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| queue_err("send", e))?;
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: i32,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, GatewayError> {
        let wait_secs = wait.as_secs().min(MAX_WAIT_SECS) as i32;
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_secs)
            .send()
            .await
            .map_err(|e| queue_err("receive", e))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                Some(ReceivedMessage {
                    receipt_handle: m.receipt_handle?,
                    body: m.body.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), GatewayError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| queue_err("delete", e))?;
        Ok(())
    }
}
