// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the gateway's pluggable backends.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod counter;
pub mod queue;
pub mod sender;
pub mod storage;

pub use adapter::PluginAdapter;
pub use counter::CounterStore;
pub use queue::{QueueBackend, ReceivedMessage};
pub use sender::MessageSender;
pub use storage::StorageAdapter;
