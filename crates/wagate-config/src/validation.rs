// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express, such
//! as the bind address shape, positive limits and queue-mode prerequisites.

use crate::diagnostic::ConfigError;
use crate::model::{QueueMode, WagateConfig};

/// Upper bound SQS accepts for a long-poll wait.
const MAX_SQS_WAIT_SECS: u64 = 20;

/// Upper bound SQS accepts for messages per receive.
const MAX_SQS_MESSAGES: i32 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &WagateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.whatsapp.graph_version.trim().is_empty() {
        fail("whatsapp.graph_version must not be empty".to_string());
    }

    let base = &config.whatsapp.api_base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        fail(format!(
            "whatsapp.api_base_url `{base}` must start with http:// or https://"
        ));
    }

    if config.rate_limit.per_minute == 0 {
        fail("rate_limit.per_minute must be at least 1".to_string());
    }

    if config.conversation.window_minutes < 1 {
        fail(format!(
            "conversation.window_minutes must be at least 1, got {}",
            config.conversation.window_minutes
        ));
    }

    if config.queue.mode == QueueMode::Sqs
        && config
            .queue
            .sqs_queue_url
            .as_deref()
            .is_none_or(|url| url.trim().is_empty())
    {
        fail("queue.sqs_queue_url is required when queue.mode is `sqs`".to_string());
    }

    if config.queue.sqs_wait_time_secs > MAX_SQS_WAIT_SECS {
        fail(format!(
            "queue.sqs_wait_time_secs must be at most {MAX_SQS_WAIT_SECS}, got {}",
            config.queue.sqs_wait_time_secs
        ));
    }

    if !(1..=MAX_SQS_MESSAGES).contains(&config.queue.sqs_max_messages) {
        fail(format!(
            "queue.sqs_max_messages must be between 1 and {MAX_SQS_MESSAGES}, got {}",
            config.queue.sqs_max_messages
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.metrics.report_interval_secs == 0 {
        fail("metrics.report_interval_secs must be at least 1".to_string());
    }

    let rate = config.metrics.failure_rate_threshold;
    if !(rate > 0.0 && rate <= 1.0) {
        fail(format!(
            "metrics.failure_rate_threshold must be in (0, 1], got {rate}"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
