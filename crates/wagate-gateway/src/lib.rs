// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the wagate messaging service.
//!
//! Receives provider webhooks (handshake, signed event deliveries), manages
//! message templates, accepts outbound messages into the delivery queue, and
//! serves health and metrics endpoints.

pub mod error;
pub mod handlers;
pub mod messages;
pub mod server;
pub mod signature;
pub mod templates;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};
pub use server::{AppState, HealthState, ListenConfig, build_router, start_server};
pub use signature::WebhookSecrets;
