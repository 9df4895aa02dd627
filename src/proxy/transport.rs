//! Upstream HTTP transport
//!
//! Issues the actual GET through a forward proxy. Plain-HTTP targets are sent to the proxy in
//! absolute form; HTTPS targets go through a CONNECT tunnel.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use crate::error::{Result, ScraperError};
use crate::models::Proxy;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Raw response from the target, whatever its status
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, if one exists
    pub reason: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client able to fetch a URL through a given proxy
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// GET `url` through `proxy`
    ///
    /// Non-2xx responses are returned as `Ok`; only transport failures are errors.
    async fn get(&self, proxy: &Proxy, url: &str) -> Result<UpstreamResponse>;
}

/// `reqwest`-backed upstream client
///
/// Keeps one `reqwest::Client` per proxy so connections to a proxy are pooled across scrapes.
pub struct ReqwestClient {
    timeout: Duration,
    clients: DashMap<String, reqwest::Client>,
}

impl ReqwestClient {
    /// Create a client whose requests each time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: DashMap::new(),
        }
    }

    fn client_for(&self, proxy: &Proxy) -> Result<reqwest::Client> {
        match self.clients.entry(proxy.key()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                debug!("Building HTTP client for proxy {}", proxy);
                let client = reqwest::Client::builder()
                    .proxy(reqwest::Proxy::all(proxy.url()).map_err(|e| {
                        ScraperError::Upstream(format!("Invalid proxy {}: {}", proxy, e))
                    })?)
                    .timeout(self.timeout)
                    .connect_timeout(self.timeout)
                    .default_headers(default_headers())
                    .build()
                    .map_err(|e| {
                        ScraperError::Internal(format!("Failed to build HTTP client: {}", e))
                    })?;
                Ok(entry.insert(client).clone())
            }
        }
    }

    fn describe_error(&self, err: reqwest::Error) -> ScraperError {
        if err.is_timeout() {
            ScraperError::Upstream(format!(
                "timeout of {}ms exceeded",
                self.timeout.as_millis()
            ))
        } else if err.is_connect() {
            ScraperError::Upstream(format!("proxy connection failed: {}", err))
        } else {
            ScraperError::Upstream(err.to_string())
        }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestClient {
    #[instrument(skip(self, proxy), fields(proxy = %proxy))]
    async fn get(&self, proxy: &Proxy, url: &str) -> Result<UpstreamResponse> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| self.describe_error(e))?;

        let status = response.status();
        let headers = flatten_headers(response.headers());
        let body = response.text().await.map_err(|e| self.describe_error(e))?;

        Ok(UpstreamResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// Collapse a header map to one string per name, joining repeated values with ", "
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}
