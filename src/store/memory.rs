//! In-process counter store
//!
//! Only coordinates scrapers inside one process. Useful for local runs and tests; deployments
//! with several instances should point them all at Redis.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::CounterStore;
use crate::error::Result;

/// Purge expired slots once the map grows past this many keys
const PURGE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: u64,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Counter store backed by a `DashMap`
///
/// Increments hold the shard lock for the key, so count and expiry always change together.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    slots: DashMap<String, Slot>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Drop every expired counter
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.slots.retain(|_, slot| slot.is_live(now));
    }

    /// Number of tracked keys, live or not yet purged
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        let now = Instant::now();
        Ok(self
            .slots
            .get(key)
            .and_then(|slot| slot.is_live(now).then_some(slot.count)))
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64> {
        if self.slots.len() > PURGE_THRESHOLD {
            self.purge_expired();
        }

        let now = Instant::now();
        let mut slot = self.slots.entry(key.to_string()).or_insert(Slot {
            count: 0,
            expires_at: now,
        });

        if !slot.is_live(now) {
            slot.count = 0;
        }
        slot.count += 1;
        slot.expires_at = now + ttl;

        Ok(slot.count)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
