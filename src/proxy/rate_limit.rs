//! Per-proxy request quota
//!
//! Counts requests against each upstream proxy in a one-second window held in the shared
//! counter store. Every increment renews the key's expiry, so a window closes one second after
//! the most recent request rather than on a wall-clock boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::models::Proxy;
use crate::store::CounterStore;

/// Lifetime of a proxy's request counter after its latest increment
pub const QUOTA_WINDOW: Duration = Duration::from_secs(1);

/// Rate limiter for upstream proxies
///
/// Backend failures never reach the caller: checks fail open and increments are dropped, so
/// a counter store outage costs quota accuracy but not availability.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a limiter over an already connected counter store
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Whether `proxy` has used up its quota for the current window
    pub async fn is_limited(&self, proxy: &Proxy) -> bool {
        let limit = proxy.requests_per_second();

        match self.store.get(&proxy.rate_limit_key()).await {
            Ok(count) => {
                let count = count.unwrap_or(0);
                if count >= limit {
                    debug!(
                        "Rate limit exceeded for proxy {} ({}/{} req/s)",
                        proxy, count, limit
                    );
                    return true;
                }
                false
            }
            Err(e) => {
                error!(proxy = %proxy, error = %e, "Failed to check rate limit");
                false
            }
        }
    }

    /// Charge one request to `proxy` and renew its window
    pub async fn record_request(&self, proxy: &Proxy) {
        match self
            .store
            .incr_with_expiry(&proxy.rate_limit_key(), QUOTA_WINDOW)
            .await
        {
            Ok(count) => debug!("Incremented request count for proxy {} to {}", proxy, count),
            Err(e) => error!(proxy = %proxy, error = %e, "Failed to increment rate limit"),
        }
    }
}
