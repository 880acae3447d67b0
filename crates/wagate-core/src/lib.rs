// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the wagate messaging gateway.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the workspace. Storage, sender, counter and
//! queue backends all implement traits defined here.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::GatewayError;
pub use types::{
    AdapterType, Contact, Conversation, Direction, HealthStatus, InboundText, Message,
    MessageKind, MessageStatus, NewTemplate, OutboundContent, OutboundRecord, OutboundRequest,
    SendReceipt, StatusUpdate, Template, TemplateCategory, TemplateFilter, TemplateSend,
    TemplateStatus,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CounterStore, MessageSender, PluginAdapter, QueueBackend, ReceivedMessage, StorageAdapter,
};
