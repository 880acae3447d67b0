// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the wagate gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level gateway configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WagateConfig {
    /// HTTP listener and webhook secrets.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and endpoint.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Per-recipient send budget.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Conversation window settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Delivery queue mode and managed-queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Metrics reporting and alert thresholds.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Token echoed back during the webhook verification handshake.
    /// `None` rejects every handshake.
    #[serde(default, deserialize_with = "lenient_string")]
    pub verify_token: Option<String>,

    /// Secret keying the HMAC-SHA256 webhook signature.
    #[serde(default, deserialize_with = "lenient_string")]
    pub app_secret: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            verify_token: None,
            app_secret: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// WhatsApp Cloud API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Bearer token for the Graph API. Required by `serve`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,

    /// Sending phone number id. Required by `serve`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number_id: Option<String>,

    /// Graph API version path segment.
    #[serde(default = "default_graph_version")]
    pub graph_version: String,

    /// Base URL of the Graph API (overridable for tests and proxies).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("phone_number_id", &self.phone_number_id)
            .field("graph_version", &self.graph_version)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            token: None,
            phone_number_id: None,
            graph_version: default_graph_version(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_graph_version() -> String {
    "v19.0".to_string()
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

/// Rate limiter configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum sends per recipient per UTC minute.
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,

    /// Shared counter store. `None` keeps counters in process memory.
    #[serde(default, deserialize_with = "lenient_string")]
    pub redis_url: Option<String>,
}

impl std::fmt::Debug for RateLimitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redis URLs may embed credentials.
        f.debug_struct("RateLimitConfig")
            .field("per_minute", &self.per_minute)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            redis_url: None,
        }
    }
}

fn default_per_minute() -> u32 {
    20
}

/// Conversation window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Minutes a conversation stays open after its latest message.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
        }
    }
}

fn default_window_minutes() -> i64 {
    1440
}

/// Which delivery queue the process runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// In-process retry queue.
    #[default]
    Local,
    /// AWS SQS managed queue.
    Sqs,
}

/// Delivery queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    #[serde(default)]
    pub mode: QueueMode,

    /// Queue URL, required when `mode = "sqs"`.
    #[serde(default)]
    pub sqs_queue_url: Option<String>,

    /// AWS region. `None` falls back to the SDK's default chain.
    #[serde(default)]
    pub aws_region: Option<String>,

    /// Long-poll wait per receive, in seconds (at most 20).
    #[serde(default = "default_sqs_wait_time_secs")]
    pub sqs_wait_time_secs: u64,

    /// Pause between consumer iterations, in milliseconds.
    #[serde(default = "default_sqs_poll_interval_ms")]
    pub sqs_poll_interval_ms: u64,

    /// Messages per receive (1 to 10).
    #[serde(default = "default_sqs_max_messages")]
    pub sqs_max_messages: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::default(),
            sqs_queue_url: None,
            aws_region: None,
            sqs_wait_time_secs: default_sqs_wait_time_secs(),
            sqs_poll_interval_ms: default_sqs_poll_interval_ms(),
            sqs_max_messages: default_sqs_max_messages(),
        }
    }
}

fn default_sqs_wait_time_secs() -> u64 {
    20
}

fn default_sqs_poll_interval_ms() -> u64 {
    1000
}

fn default_sqs_max_messages() -> i32 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wagate").join("wagate.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wagate.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Metrics reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Seconds between snapshot log lines and alert checks.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// Alert when `failed / sent` exceeds this fraction.
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f64,

    /// Alert when the average send latency exceeds this many milliseconds.
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval_secs(),
            failure_rate_threshold: default_failure_rate_threshold(),
            latency_threshold_ms: default_latency_threshold_ms(),
        }
    }
}

fn default_report_interval_secs() -> u64 {
    60
}

fn default_failure_rate_threshold() -> f64 {
    0.10
}

fn default_latency_threshold_ms() -> u64 {
    5000
}

/// Accepts strings and bare integers for string-typed secrets and ids.
///
/// Environment values such as `PHONE_NUMBER_ID=1234567890` arrive as numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> serde::de::Visitor<'de> for LenientVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a string or integer")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(LenientVisitor)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}
