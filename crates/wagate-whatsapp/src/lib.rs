// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API integration: the outbound sender, the wire types,
//! webhook signature checks and webhook event extraction.

pub mod client;
pub mod signature;
pub mod types;
pub mod webhook;

pub use client::WhatsAppClient;
pub use signature::{SIGNATURE_HEADER, compute_signature, verify_signature};
pub use types::WebhookPayload;
pub use webhook::{first_inbound_text, status_updates};
