//! Shared test doubles

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiServer, AppState};
use crate::config::{
    Config, CounterBackend, CounterConfig, LogConfig, ScraperConfig, ServerConfig,
};
use crate::error::{Result, ScraperError};
use crate::models::Proxy;
use crate::proxy::pool::ProxyPool;
use crate::proxy::rate_limit::RateLimiter;
use crate::proxy::rotation::{create_selector, ProbeStrategy};
use crate::proxy::scraper::Scraper;
use crate::proxy::transport::{UpstreamClient, UpstreamResponse};
use crate::store::{CounterStore, MemoryCounterStore};

pub fn create_test_proxy(host: &str, port: u16) -> Proxy {
    Proxy {
        host: host.to_string(),
        port,
        country_code: "US".to_string(),
        country: Some("United States".to_string()),
        anonymity: "elite proxy".to_string(),
        google: None,
        https: true,
        requests_per_second: Some(5),
    }
}

/// Pool of `n` proxies on 10.0.0.1..=10.0.0.n, port 8080
pub fn create_test_pool(n: usize) -> Arc<ProxyPool> {
    let proxies = (1..=n)
        .map(|i| create_test_proxy(&format!("10.0.0.{}", i), 8080))
        .collect();
    Arc::new(ProxyPool::new(proxies).unwrap())
}

pub fn create_test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        proxy_list_path: "proxies.json".to_string(),
        counter: CounterConfig {
            backend: CounterBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
        },
        scraper: ScraperConfig {
            retry_base_delay: Duration::ZERO,
            probe_strategy: ProbeStrategy::FullScan,
            ..ScraperConfig::default()
        },
        log: LogConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Full API router over a test pool, with deterministic selection and no backoff
pub fn create_test_app(
    pool_size: usize,
    store: Arc<dyn CounterStore>,
    client: Arc<dyn UpstreamClient>,
) -> (axum::Router, Arc<ProxyPool>) {
    let pool = create_test_pool(pool_size);
    let config = create_test_config();
    let limiter = RateLimiter::new(store.clone());
    let selector = create_selector(config.scraper.probe_strategy, pool.clone(), limiter.clone());
    let scraper = Arc::new(Scraper::new(
        selector,
        limiter,
        client,
        config.scraper.clone(),
    ));

    let state = AppState::new(scraper, store, config);
    (ApiServer::build_router(state), pool)
}

/// Memory store that records every call it receives
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCounterStore,
    pub reads: AtomicUsize,
    pub increments: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Keys passed to `incr_with_expiry`, in call order
    pub fn incremented_keys(&self) -> Vec<String> {
        self.increments.lock().unwrap().clone()
    }

    /// Push `proxy` to its quota without recording the calls
    pub async fn exhaust(&self, proxy: &Proxy) {
        for _ in 0..proxy.requests_per_second() {
            self.inner
                .incr_with_expiry(&proxy.rate_limit_key(), Duration::from_secs(60))
                .await
                .unwrap();
        }
    }
}

#[async_trait]
impl CounterStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64> {
        self.increments.lock().unwrap().push(key.to_string());
        self.inner.incr_with_expiry(key, ttl).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// Store whose reads always fail; increments are counted and dropped
#[derive(Default)]
pub struct BrokenReadStore {
    pub increments: AtomicUsize,
}

#[async_trait]
impl CounterStore for BrokenReadStore {
    async fn get(&self, _key: &str) -> Result<Option<u64>> {
        Err(ScraperError::BackendDegraded("read timed out".to_string()))
    }

    async fn incr_with_expiry(&self, _key: &str, _ttl: Duration) -> Result<u64> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        Err(ScraperError::BackendDegraded("write timed out".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Err(ScraperError::BackendDegraded("ping timed out".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "broken"
    }
}

/// Scripted outcome for one upstream call
#[derive(Clone)]
pub enum Scripted {
    Ok(u16, &'static str),
    Fail(&'static str),
}

/// Upstream client that replays scripted outcomes in order and records which proxy served
/// each call. Once the script runs out every call succeeds with 200.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<Vec<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(mut script: Vec<Scripted>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Proxy keys used, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedClient {
    async fn get(&self, proxy: &Proxy, _url: &str) -> Result<UpstreamResponse> {
        self.calls.lock().unwrap().push(proxy.key());
        let next = self.script.lock().unwrap().pop();

        match next.unwrap_or(Scripted::Ok(200, "<html>ok</html>")) {
            Scripted::Ok(status, body) => {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), "text/html".to_string());
                Ok(UpstreamResponse {
                    status,
                    reason: None,
                    headers,
                    body: body.to_string(),
                })
            }
            Scripted::Fail(message) => Err(ScraperError::Upstream(message.to_string())),
        }
    }
}
