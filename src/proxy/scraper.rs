//! Retrying fetcher
//!
//! Drives one scrape: pick an untried proxy with quota left, charge it, fetch through it, and
//! on failure back off and move to another proxy until the attempt budget runs out.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::config::ScraperConfig;
use crate::error::{Result, ScraperError};
use crate::models::{Proxy, ScrapeResult};
use crate::proxy::rate_limit::RateLimiter;
use crate::proxy::rotation::ProxySelector;
use crate::proxy::transport::UpstreamClient;

/// Per-call bookkeeping, dropped when `fetch` returns
#[derive(Debug, Default)]
struct ScrapeAttempt {
    attempt: u32,
    tried: HashSet<String>,
    /// Same identities as `tried`, in the order they were used
    tried_order: Vec<String>,
    last_error: Option<ScraperError>,
}

impl ScrapeAttempt {
    fn mark_tried(&mut self, proxy: &Proxy) {
        let key = proxy.key();
        if self.tried.insert(key.clone()) {
            self.tried_order.push(key);
        }
    }

    fn last_cause(&self) -> String {
        match &self.last_error {
            Some(ScraperError::FetchFailed { cause, .. }) => cause.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error occurred during scraping".to_string(),
        }
    }
}

/// Fetches pages through the proxy pool
pub struct Scraper {
    selector: Arc<dyn ProxySelector>,
    limiter: RateLimiter,
    client: Arc<dyn UpstreamClient>,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(
        selector: Arc<dyn ProxySelector>,
        limiter: RateLimiter,
        client: Arc<dyn UpstreamClient>,
        config: ScraperConfig,
    ) -> Self {
        Self {
            selector,
            limiter,
            client,
            config,
        }
    }

    /// Fetch `url` through the pool
    ///
    /// Only `RateLimitExhausted`, `NoUsableProxy` and `FetchExhausted` escape; per-attempt
    /// failures are retried on a different proxy.
    #[instrument(skip(self), fields(strategy = self.selector.strategy_name()))]
    pub async fn fetch(&self, url: &str) -> Result<ScrapeResult> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut state = ScrapeAttempt::default();

        loop {
            state.attempt += 1;
            let attempt = state.attempt;

            let proxy = self.select_unused(&state).await?;
            state.mark_tried(&proxy);

            info!(
                "Attempt {}: Scraping {} using proxy {} ({})",
                attempt, url, proxy, proxy.country_code
            );

            // Charged before the request so a failing proxy still counts against its quota.
            self.limiter.record_request(&proxy).await;

            match self.attempt(&proxy, url, attempt).await {
                Ok(result) => {
                    info!("Successfully scraped {} using proxy {}", url, proxy);
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Attempt {} failed for {} using proxy {}: {}",
                        attempt, url, proxy, e
                    );
                    state.last_error = Some(e);
                }
            }

            if attempt >= max_attempts {
                error!(
                    "All {} attempts failed for {} (proxies tried: {})",
                    max_attempts,
                    url,
                    state.tried_order.join(", ")
                );
                return Err(ScraperError::FetchExhausted {
                    url: url.to_string(),
                    attempts: max_attempts,
                    last_cause: state.last_cause(),
                });
            }

            let delay = self.config.retry_base_delay * attempt;
            debug!("Waiting {:?} before attempt {}", delay, attempt + 1);
            tokio::time::sleep(delay).await;
        }
    }

    /// Ask the selector for a proxy not yet used by this scrape
    async fn select_unused(&self, state: &ScrapeAttempt) -> Result<Arc<Proxy>> {
        let budget = self.config.max_selection_attempts.max(1);

        for _ in 0..budget {
            match self.selector.select(&state.tried).await? {
                Some(proxy) if !state.tried.contains(&proxy.key()) => return Ok(proxy),
                _ => debug!(
                    "No untried proxy found, {} already used in this scrape",
                    state.tried.len()
                ),
            }
        }

        Err(ScraperError::NoUsableProxy { attempts: budget })
    }

    /// One time-bounded request through `proxy`
    async fn attempt(&self, proxy: &Arc<Proxy>, url: &str, attempt: u32) -> Result<ScrapeResult> {
        let timeout = self.config.request_timeout;

        let response = match tokio::time::timeout(timeout, self.client.get(proxy, url)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ScraperError::FetchFailed {
                    attempt,
                    cause: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScraperError::FetchFailed {
                    attempt,
                    cause: format!("timeout of {}ms exceeded", timeout.as_millis()),
                })
            }
        };

        if !response.is_success() {
            let cause = match &response.reason {
                Some(reason) => format!("HTTP {}: {}", response.status, reason),
                None => format!("HTTP {}", response.status),
            };
            return Err(ScraperError::FetchFailed { attempt, cause });
        }

        Ok(ScrapeResult {
            body: response.body,
            headers: response.headers,
            status_code: response.status,
            proxy: proxy.clone(),
        })
    }
}
