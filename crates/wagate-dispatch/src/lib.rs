// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery for the wagate gateway.
//!
//! Requests enter through a [`DeliveryQueue`], which hands them to the
//! [`Dispatcher`]: rate limit, template resolution, provider send,
//! persistence and metrics, in that order.

pub mod counter;
pub mod pipeline;
pub mod queue;
pub mod rate_limit;

pub use counter::{MemoryCounterStore, RedisCounterStore};
pub use pipeline::{Dispatcher, SendPipeline};
pub use queue::{
    DeliveryEvent, DeliveryQueue, DeliveryState, LocalRetryQueue, ManagedQueue,
    ManagedQueueSettings, SqsBackend, build_queue,
};
pub use rate_limit::RateLimiter;
