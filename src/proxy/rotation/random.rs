//! Bounded random-probe selection

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::ProxySelector;
use crate::error::{Result, ScraperError};
use crate::models::Proxy;
use crate::proxy::pool::ProxyPool;
use crate::proxy::rate_limit::RateLimiter;

/// Samples random pool entries until one has quota left
///
/// The probe budget equals the pool size and sampling is with replacement, so under heavy
/// contention a free proxy can go unsampled. Limiter reads stay O(pool size) either way.
pub struct BoundedRandomSelector {
    pool: Arc<ProxyPool>,
    limiter: RateLimiter,
}

impl BoundedRandomSelector {
    pub fn new(pool: Arc<ProxyPool>, limiter: RateLimiter) -> Self {
        Self { pool, limiter }
    }
}

#[async_trait]
impl ProxySelector for BoundedRandomSelector {
    async fn select(&self, excluding: &HashSet<String>) -> Result<Option<Arc<Proxy>>> {
        let size = self.pool.size();
        let mut saw_excluded = false;

        for _ in 0..size {
            let index = rand::thread_rng().gen_range(0..size);
            let Some(proxy) = self.pool.get(index) else {
                continue;
            };

            if excluding.contains(&proxy.key()) {
                debug!("Proxy {} already tried in this scrape, probing again", proxy);
                saw_excluded = true;
                continue;
            }

            if self.limiter.is_limited(proxy).await {
                debug!("Proxy {} is rate limited, trying another...", proxy);
                continue;
            }

            debug!(
                "Selected non-rate-limited proxy: {} ({} req/s)",
                proxy,
                proxy.requests_per_second()
            );
            return Ok(Some(proxy.clone()));
        }

        // Exhaustion needs every probe to have hit a limited proxy; an excluded sample may still
        // have quota, so the caller gets another selection instead.
        if saw_excluded {
            Ok(None)
        } else {
            Err(ScraperError::RateLimitExhausted)
        }
    }

    fn strategy_name(&self) -> &'static str {
        "random"
    }
}
