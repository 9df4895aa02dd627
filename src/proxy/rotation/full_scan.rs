//! Shuffled full-scan selection

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

use super::ProxySelector;
use crate::error::{Result, ScraperError};
use crate::models::Proxy;
use crate::proxy::pool::ProxyPool;
use crate::proxy::rate_limit::RateLimiter;

/// Visits every pool entry once, in random order
pub struct FullScanSelector {
    pool: Arc<ProxyPool>,
    limiter: RateLimiter,
}

impl FullScanSelector {
    pub fn new(pool: Arc<ProxyPool>, limiter: RateLimiter) -> Self {
        Self { pool, limiter }
    }
}

#[async_trait]
impl ProxySelector for FullScanSelector {
    async fn select(&self, excluding: &HashSet<String>) -> Result<Option<Arc<Proxy>>> {
        let mut order: Vec<usize> = (0..self.pool.size()).collect();
        order.shuffle(&mut rand::thread_rng());

        let mut saw_excluded = false;
        for index in order {
            let Some(proxy) = self.pool.get(index) else {
                continue;
            };
            if excluding.contains(&proxy.key()) {
                saw_excluded = true;
                continue;
            }
            if self.limiter.is_limited(proxy).await {
                debug!("Proxy {} is rate limited, trying another...", proxy);
                continue;
            }

            debug!("Selected non-rate-limited proxy: {}", proxy);
            return Ok(Some(proxy.clone()));
        }

        if saw_excluded {
            Ok(None)
        } else {
            Err(ScraperError::RateLimitExhausted)
        }
    }

    fn strategy_name(&self) -> &'static str {
        "full_scan"
    }
}
