//! Proxy selection under per-proxy quotas
//!
//! Both strategies draw uniformly at random among proxies that are neither already tried in
//! the current scrape nor over quota, and both consult the rate limiter at most once per pool
//! entry. They differ in what they guarantee:
//!
//! - [`BoundedRandomSelector`] samples pool indices with replacement, `pool.size()` times. It
//!   can report exhaustion while an unsampled proxy is still free.
//! - [`FullScanSelector`] walks a shuffled copy of the pool and never misses a free proxy.

mod full_scan;
mod random;

pub use full_scan::FullScanSelector;
pub use random::BoundedRandomSelector;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::pool::ProxyPool;
use super::rate_limit::RateLimiter;
use crate::error::Result;
use crate::models::Proxy;

/// How the selector probes the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    #[default]
    BoundedRandom,
    FullScan,
}

impl ProbeStrategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "full_scan" | "fullscan" | "full-scan" | "scan" => Self::FullScan,
            _ => Self::BoundedRandom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BoundedRandom => "random",
            Self::FullScan => "full_scan",
        }
    }
}

/// Trait for proxy selection strategies
#[async_trait]
pub trait ProxySelector: Send + Sync {
    /// Pick a proxy that is not in `excluding` and currently has quota left
    ///
    /// Returns `Err(RateLimitExhausted)` only when every probe found an over-quota proxy. If any
    /// probe landed on an excluded proxy and nothing was picked, returns `Ok(None)` so the caller
    /// can select again.
    async fn select(&self, excluding: &HashSet<String>) -> Result<Option<Arc<Proxy>>>;

    /// Get the strategy name
    fn strategy_name(&self) -> &'static str;
}

/// Create a proxy selector based on the strategy type
pub fn create_selector(
    strategy: ProbeStrategy,
    pool: Arc<ProxyPool>,
    limiter: RateLimiter,
) -> Arc<dyn ProxySelector> {
    match strategy {
        ProbeStrategy::BoundedRandom => Arc::new(BoundedRandomSelector::new(pool, limiter)),
        ProbeStrategy::FullScan => Arc::new(FullScanSelector::new(pool, limiter)),
    }
}
