use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Proxy;

/// Successful fetch through one proxy
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub body: String,
    pub headers: HashMap<String, String>,
    pub status_code: u16,
    pub proxy: Arc<Proxy>,
}

/// Body of `POST /api/scraper/scrape`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    pub url: Option<String>,
}

/// Proxy metadata exposed to API clients
#[derive(Debug, Clone, Serialize)]
pub struct ProxySummary {
    pub ip: String,
    pub port: u16,
    pub country: String,
    pub anonymity: String,
    pub https: bool,
}

impl From<&Proxy> for ProxySummary {
    fn from(proxy: &Proxy) -> Self {
        ProxySummary {
            ip: proxy.host.clone(),
            port: proxy.port,
            country: proxy.display_country().to_string(),
            anonymity: proxy.anonymity.clone(),
            https: proxy.https,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeData {
    pub html: String,
    pub headers: HashMap<String, String>,
    pub status_code: u16,
    pub proxy: ProxySummary,
}

impl From<ScrapeResult> for ScrapeData {
    fn from(result: ScrapeResult) -> Self {
        let proxy = ProxySummary::from(result.proxy.as_ref());
        ScrapeData {
            html: result.body,
            headers: result.headers,
            status_code: result.status_code,
            proxy,
        }
    }
}

/// Success envelope returned by the scrape endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ScrapeData,
}

impl From<ScrapeResult> for ScrapeResponse {
    fn from(result: ScrapeResult) -> Self {
        ScrapeResponse {
            success: true,
            data: result.into(),
        }
    }
}
