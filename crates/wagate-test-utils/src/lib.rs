// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for wagate integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests
//! without the provider API, Redis or SQS.
//!
//! # Components
//!
//! - [`MockSender`] - scripted provider sender that records every call
//! - [`SpyStorage`] / [`SpyCounterStore`] - wrappers that log calls into a shared [`CallLog`]
//! - [`ManualClock`] - settable domain clock
//! - [`MemoryQueueBackend`] - in-memory managed queue with visibility semantics
//! - [`TestHarness`] - temp SQLite plus a wired [`wagate_dispatch::Dispatcher`]

pub mod call_log;
pub mod clock;
pub mod fixtures;
pub mod harness;
pub mod memory_queue;
pub mod mock_sender;
pub mod spy;

pub use call_log::CallLog;
pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_queue::MemoryQueueBackend;
pub use mock_sender::{MockSender, SentCall};
pub use spy::{SpyCounterStore, SpyStorage};
