// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./wagate.toml` > `~/.config/wagate/wagate.toml`
//! > `/etc/wagate/wagate.toml`, with overrides from the gateway's recognized
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WagateConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wagate/wagate.toml";

/// Local config file, resolved against the working directory.
pub const LOCAL_CONFIG_PATH: &str = "wagate.toml";

/// Recognized environment variables and the config key each one sets.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("VERIFY_TOKEN", "server.verify_token"),
    ("APP_SECRET", "server.app_secret"),
    ("LOG_LEVEL", "server.log_level"),
    ("WHATSAPP_TOKEN", "whatsapp.token"),
    ("PHONE_NUMBER_ID", "whatsapp.phone_number_id"),
    ("GRAPH_VERSION", "whatsapp.graph_version"),
    ("WHATSAPP_API_BASE_URL", "whatsapp.api_base_url"),
    ("RATE_LIMIT_PER_MINUTE", "rate_limit.per_minute"),
    ("REDIS_URL", "rate_limit.redis_url"),
    ("WINDOW_MINUTES", "conversation.window_minutes"),
    ("QUEUE_MODE", "queue.mode"),
    ("SQS_QUEUE_URL", "queue.sqs_queue_url"),
    ("AWS_REGION", "queue.aws_region"),
    ("SQS_WAIT_TIME", "queue.sqs_wait_time_secs"),
    ("SQS_POLL_INTERVAL_MS", "queue.sqs_poll_interval_ms"),
    ("SQS_MAX_MESSAGES", "queue.sqs_max_messages"),
    ("DATABASE_PATH", "storage.database_path"),
    ("METRICS_REPORT_INTERVAL_SECS", "metrics.report_interval_secs"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wagate/wagate.toml` (system-wide)
/// 3. `~/.config/wagate/wagate.toml` (user XDG config)
/// 4. `./wagate.toml` (local directory)
/// 5. Recognized environment variables (see [`ENV_KEYS`])
pub fn load_config() -> Result<WagateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WagateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WagateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WagateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WagateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WagateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `~/.config/wagate/wagate.toml`, when a config dir exists on this platform.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("wagate/wagate.toml"))
}

/// Environment provider over the fixed variable table.
///
/// Uses an explicit lookup instead of `Env::split("_")`: names like
/// `PHONE_NUMBER_ID` would otherwise nest as `phone.number.id`. Unlisted
/// variables are ignored, so the process environment can never trip
/// `deny_unknown_fields`.
fn env_provider() -> Env {
    Env::raw().filter_map(|key| {
        ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}
