//! Shared counter backends for per-proxy request accounting
//!
//! The rate limiter only needs two primitives from a backend: a plain read and an
//! increment that refreshes the key's expiry in the same indivisible step.

mod memory;
mod redis_store;

pub use memory::MemoryCounterStore;
pub use redis_store::RedisCounterStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{CounterBackend, CounterConfig};
use crate::error::Result;

/// Key-value counter store shared by every scraper instance
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of `key`, or `None` if it is absent or expired
    async fn get(&self, key: &str) -> Result<Option<u64>>;

    /// Increment `key` and set its expiry to `ttl` from now, atomically
    ///
    /// Returns the counter value after the increment. A key with no live value starts at 1.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Backend name for health reporting
    fn backend_name(&self) -> &'static str;
}

/// Connect the configured backend
pub async fn connect(config: &CounterConfig) -> Result<Arc<dyn CounterStore>> {
    match config.backend {
        CounterBackend::Redis => Ok(Arc::new(RedisCounterStore::connect(&config.redis_url).await?)),
        CounterBackend::Memory => Ok(Arc::new(MemoryCounterStore::new())),
    }
}
