// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter stores backing the per-minute rate limit.
//!
//! Both stores set the expiry only when an increment creates the key, so a
//! bucket always dies `ttl` after its first hit.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use tokio::time::Instant;
use tracing::{debug, info};
use wagate_core::{AdapterType, CounterStore, GatewayError, HealthStatus, PluginAdapter};

/// Expired entries are swept once the map grows past this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

/// In-process counter store. Limits only hold within one process.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, (u64, Instant)>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live and not yet swept keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    fn sweep(&self, now: Instant) {
        let before = self.counters.len();
        self.counters.retain(|_, (_, expires_at)| *expires_at > now);
        debug!(removed = before - self.counters.len(), "expired rate-limit buckets swept");
    }
}

#[async_trait]
impl PluginAdapter for MemoryCounterStore {
    fn name(&self) -> &str {
        "memory-counter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, GatewayError> {
        let now = Instant::now();
        if self.counters.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert((0, now + ttl));
        let (count, expires_at) = entry.value_mut();
        if *expires_at <= now {
            *count = 0;
            *expires_at = now + ttl;
        }
        *count += 1;
        Ok(*count)
    }
}

/// INCR, then EXPIRE only when the key was just created.
const INCR_WITH_EXPIRY: &str = r"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
";

/// Redis-backed counter store shared by every gateway process.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: redis::Script,
}

impl RedisCounterStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, GatewayError> {
        let client = redis::Client::open(url).map_err(counter_err)?;
        let conn = ConnectionManager::new(client).await.map_err(counter_err)?;
        info!("connected to redis counter store");
        Ok(Self {
            conn,
            script: redis::Script::new(INCR_WITH_EXPIRY),
        })
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

fn counter_err(e: redis::RedisError) -> GatewayError {
    GatewayError::CounterStore {
        source: Box::new(e),
    }
}

#[async_trait]
impl PluginAdapter for RedisCounterStore {
    fn name(&self) -> &str {
        "redis-counter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        let mut conn = self.conn.clone();
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        Ok(match pong {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(format!("redis ping failed: {e}")),
        })
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, GatewayError> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .script
            .key(key)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(counter_err)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn counts_within_a_bucket() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.incr_with_expiry("k", TTL).await.unwrap(), 1);
        assert_eq!(store.incr_with_expiry("k", TTL).await.unwrap(), 2);
        assert_eq!(store.incr_with_expiry("other", TTL).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn later_increments_do_not_extend_expiry() {
        let store = MemoryCounterStore::new();
        store.incr_with_expiry("k", TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(store.incr_with_expiry("k", TTL).await.unwrap(), 2);
        // 60s after the first hit the bucket is gone, even though the second
        // hit was only 10s ago.
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.incr_with_expiry("k", TTL).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_expired_keys() {
        let store = MemoryCounterStore::new();
        store.incr_with_expiry("a", TTL).await.unwrap();
        store.incr_with_expiry("b", Duration::from_secs(600)).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        store.sweep(Instant::now());
        assert_eq!(store.len(), 1);
    }
}
