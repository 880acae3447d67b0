// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process delivery with bounded retry.
//!
//! One scheduler task owns every pending [`RetryState`] in a min-heap keyed
//! by `next_eligible_at`. Due entries are attempted in their own tasks, so
//! the scheduler never waits on I/O. A failed attempt sends its successor
//! back to the scheduler through the same channel `enqueue_send` uses.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wagate_config::QueueMode;
use wagate_core::{GatewayError, OutboundRequest};

use super::DeliveryQueue;
use crate::pipeline::SendPipeline;

/// Retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Delay before retry `n + 1`, indexed by the attempt that failed.
pub const BACKOFF: [Duration; 3] = [
    Duration::from_secs(10),
    Duration::from_secs(60),
    Duration::from_secs(300),
];

const EVENT_CAPACITY: usize = 1024;

/// Delay after a failed `attempt`; the last entry repeats past the table.
pub fn backoff_for(attempt: u32) -> Duration {
    BACKOFF
        .get(attempt as usize)
        .copied()
        .unwrap_or(BACKOFF[BACKOFF.len() - 1])
}

/// Where one delivery stands.
///
/// `Pending → Sending → {Sent | RetryScheduled → Pending} → {PersistedSent |
/// PermanentlyFailed}`. The pipeline sends and persists in one call, so
/// `Sent` and `PersistedSent` are reported back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Pending,
    Sending,
    Sent,
    RetryScheduled,
    PersistedSent,
    PermanentlyFailed,
}

impl DeliveryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::PersistedSent | DeliveryState::PermanentlyFailed)
    }
}

/// A state change, broadcast to [`LocalRetryQueue::subscribe`]rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    pub delivery_id: u64,
    pub attempt: u32,
    pub state: DeliveryState,
}

/// One delivery waiting for its next attempt.
#[derive(Debug, Clone)]
struct RetryState {
    delivery_id: u64,
    request: OutboundRequest,
    attempt: u32,
    next_eligible_at: Instant,
}

/// Heap entry ordered so the earliest deadline pops first.
struct Scheduled(RetryState);

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .next_eligible_at
            .cmp(&self.0.next_eligible_at)
            .then_with(|| other.0.delivery_id.cmp(&self.0.delivery_id))
    }
}

/// Local-mode queue.
pub struct LocalRetryQueue {
    tx: mpsc::UnboundedSender<RetryState>,
    events: broadcast::Sender<DeliveryEvent>,
    next_id: AtomicU64,
    cancel: CancellationToken,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl LocalRetryQueue {
    /// Start the scheduler. It stops when `cancel` (or [`DeliveryQueue::shutdown`])
    /// fires.
    pub fn spawn(pipeline: Arc<dyn SendPipeline>, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cancel = cancel.child_token();

        let scheduler = Scheduler {
            rx,
            tx: tx.clone(),
            pipeline,
            events: events.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(scheduler.run());

        Self {
            tx,
            events,
            next_id: AtomicU64::new(1),
            cancel,
            scheduler: Mutex::new(Some(handle)),
        }
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl DeliveryQueue for LocalRetryQueue {
    async fn enqueue_send(&self, request: OutboundRequest) -> Result<(), GatewayError> {
        let delivery_id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let state = RetryState {
            delivery_id,
            request,
            attempt: 0,
            next_eligible_at: Instant::now(),
        };
        self.tx.send(state).map_err(|_| GatewayError::Queue {
            message: "local queue is shut down".into(),
            source: None,
        })?;
        debug!(delivery_id, "outbound request queued");
        Ok(())
    }

    fn mode(&self) -> QueueMode {
        QueueMode::Local
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.scheduler.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "local queue scheduler panicked");
            }
        }
    }
}

struct Scheduler {
    rx: mpsc::UnboundedReceiver<RetryState>,
    tx: mpsc::UnboundedSender<RetryState>,
    pipeline: Arc<dyn SendPipeline>,
    events: broadcast::Sender<DeliveryEvent>,
    cancel: CancellationToken,
}

impl Scheduler {
    async fn run(mut self) {
        let mut heap: BinaryHeap<Scheduled> = BinaryHeap::new();
        let mut in_flight = JoinSet::new();
        info!("local delivery queue started");

        loop {
            let next_ready = heap.peek().map(|s| s.0.next_eligible_at);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                Some(state) = self.rx.recv() => {
                    emit(&self.events, &state, DeliveryState::Pending);
                    heap.push(Scheduled(state));
                }
                _ = sleep_until_opt(next_ready) => {
                    let now = Instant::now();
                    while heap.peek().is_some_and(|s| s.0.next_eligible_at <= now) {
                        let Some(Scheduled(state)) = heap.pop() else { break };
                        in_flight.spawn(attempt(
                            state,
                            self.pipeline.clone(),
                            self.tx.clone(),
                            self.events.clone(),
                        ));
                    }
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        if !heap.is_empty() {
            warn!(pending = heap.len(), "local queue stopped with deliveries still waiting");
        }
        // In-flight sends are never cut short.
        while in_flight.join_next().await.is_some() {}
        info!("local delivery queue stopped");
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn emit(events: &broadcast::Sender<DeliveryEvent>, state: &RetryState, to: DeliveryState) {
    // No subscribers is fine.
    let _ = events.send(DeliveryEvent {
        delivery_id: state.delivery_id,
        attempt: state.attempt,
        state: to,
    });
}

async fn attempt(
    state: RetryState,
    pipeline: Arc<dyn SendPipeline>,
    tx: mpsc::UnboundedSender<RetryState>,
    events: broadcast::Sender<DeliveryEvent>,
) {
    emit(&events, &state, DeliveryState::Sending);

    match pipeline.send_and_persist(&state.request).await {
        Ok(wa_message_id) => {
            emit(&events, &state, DeliveryState::Sent);
            emit(&events, &state, DeliveryState::PersistedSent);
            info!(
                delivery_id = state.delivery_id,
                attempt = state.attempt,
                wa_message_id = %wa_message_id,
                "delivery complete"
            );
        }
        Err(e) if e.is_retryable() && state.attempt < MAX_RETRIES => {
            let delay = backoff_for(state.attempt);
            warn!(
                delivery_id = state.delivery_id,
                attempt = state.attempt,
                retry_in_ms = delay.as_millis() as u64,
                error = %e,
                "delivery failed, retry scheduled"
            );
            emit(&events, &state, DeliveryState::RetryScheduled);
            let next = RetryState {
                attempt: state.attempt + 1,
                next_eligible_at: Instant::now() + delay,
                ..state
            };
            if tx.send(next).is_err() {
                warn!("local queue shut down before retry could be scheduled");
            }
        }
        Err(e) => {
            let failure = GatewayError::PermanentSendFailure {
                attempts: state.attempt + 1,
                last_error: e.to_string(),
            };
            error!(
                delivery_id = state.delivery_id,
                to = %state.request.to,
                error = %failure,
                "delivery dropped"
            );
            emit(&events, &state, DeliveryState::PermanentlyFailed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_table_and_overflow() {
        assert_eq!(backoff_for(0), Duration::from_secs(10));
        assert_eq!(backoff_for(1), Duration::from_secs(60));
        assert_eq!(backoff_for(2), Duration::from_secs(300));
        assert_eq!(backoff_for(7), Duration::from_secs(300));
    }

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let state = |id, secs| {
            Scheduled(RetryState {
                delivery_id: id,
                request: OutboundRequest::text("1", "x"),
                attempt: 0,
                next_eligible_at: now + Duration::from_secs(secs),
            })
        };
        let mut heap = BinaryHeap::new();
        heap.push(state(1, 60));
        heap.push(state(2, 10));
        heap.push(state(3, 30));
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|s| s.0.delivery_id)).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn terminal_states() {
        assert!(DeliveryState::PersistedSent.is_terminal());
        assert!(DeliveryState::PermanentlyFailed.is_terminal());
        assert!(!DeliveryState::RetryScheduled.is_terminal());
    }
}
