//! Static proxy catalog
//!
//! Loaded once at startup and never mutated, so readers share it through an `Arc` without
//! locking.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, ScraperError};
use crate::models::Proxy;

/// Proxies below this count make per-request rotation thin
const SMALL_POOL_WARNING: usize = 3;

/// Immutable, ordered set of upstream proxies
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<Arc<Proxy>>,
}

impl ProxyPool {
    /// Build a pool, rejecting empty lists, duplicate identities and zero quotas
    pub fn new(proxies: Vec<Proxy>) -> Result<Self> {
        if proxies.is_empty() {
            return Err(ScraperError::ProxyList("proxy list is empty".into()));
        }

        let mut seen = HashSet::with_capacity(proxies.len());
        for (index, proxy) in proxies.iter().enumerate() {
            if proxy.host.trim().is_empty() {
                return Err(ScraperError::ProxyList(format!(
                    "entry {} has an empty host",
                    index
                )));
            }
            if proxy.port == 0 {
                return Err(ScraperError::ProxyList(format!(
                    "entry {} ({}) has port 0",
                    index, proxy.host
                )));
            }
            if proxy.requests_per_second == Some(0) {
                return Err(ScraperError::ProxyList(format!(
                    "entry {} ({}) has requests_per_second 0",
                    index, proxy
                )));
            }
            if !seen.insert(proxy.key()) {
                return Err(ScraperError::ProxyList(format!(
                    "duplicate proxy {}",
                    proxy
                )));
            }
        }

        if proxies.len() < SMALL_POOL_WARNING {
            warn!(
                "Only {} proxies loaded; retries may run out of untried proxies",
                proxies.len()
            );
        }

        Ok(Self {
            proxies: proxies.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a proxy list, either `{"proxies": [...]}` or a bare array
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ScraperError::ProxyList(format!("invalid JSON: {}", e)))?;

        let entries = match value {
            Value::Object(mut map) => map.remove("proxies").ok_or_else(|| {
                ScraperError::ProxyList("expected a \"proxies\" array".into())
            })?,
            array @ Value::Array(_) => array,
            _ => {
                return Err(ScraperError::ProxyList(
                    "expected an object or an array".into(),
                ))
            }
        };

        let proxies: Vec<Proxy> = serde_json::from_value(entries)
            .map_err(|e| ScraperError::ProxyList(format!("malformed entry: {}", e)))?;

        Self::new(proxies)
    }

    /// Read and parse a proxy list file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::ProxyList(format!("failed to read {}: {}", path.display(), e))
        })?;

        let pool = Self::from_json_str(&raw)?;
        info!("Loaded {} proxies from {}", pool.size(), path.display());
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.proxies.len()
    }

    /// All proxies in list order
    pub fn all(&self) -> &[Arc<Proxy>] {
        &self.proxies
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Proxy>> {
        self.proxies.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LIST: &str = r#"{
        "proxies": [
            {"ip_address": "173.209.63.70", "port": 8040, "code": "CA", "country": "Canada",
             "anonymity": "anonymous", "google": false, "https": true, "requests_per_second": 2},
            {"ip_address": "51.158.68.133", "port": 8811, "code": "FR", "country": "France",
             "anonymity": "elite proxy", "google": null, "https": false}
        ]
    }"#;

    #[test]
    fn test_pool_from_wrapped_list() {
        let pool = ProxyPool::from_json_str(LIST).unwrap();

        assert_eq!(pool.size(), 2);
        assert_eq!(pool.all()[0].key(), "173.209.63.70:8040");
        assert_eq!(pool.all()[0].requests_per_second(), 2);
        assert_eq!(pool.get(1).unwrap().requests_per_second(), 1);
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn test_pool_from_bare_array() {
        let pool = ProxyPool::from_json_str(
            r#"[{"host": "10.0.0.1", "port": 3128, "country_code": "US",
                 "anonymity": "transparent", "https": false}]"#,
        )
        .unwrap();

        assert_eq!(pool.size(), 1);
        assert_eq!(pool.all()[0].host, "10.0.0.1");
    }

    #[test]
    fn test_pool_rejects_empty_list() {
        let err = ProxyPool::from_json_str(r#"{"proxies": []}"#).unwrap_err();
        assert!(matches!(err, ScraperError::ProxyList(_)));
    }

    #[test]
    fn test_pool_rejects_malformed_input() {
        for raw in [
            "not json",
            r#"{"servers": []}"#,
            r#""just a string""#,
            r#"[{"host": "10.0.0.1"}]"#,
            r#"[{"host": "10.0.0.1", "port": 70000, "country_code": "US",
                 "anonymity": "x", "https": false}]"#,
        ] {
            assert!(
                matches!(ProxyPool::from_json_str(raw), Err(ScraperError::ProxyList(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_pool_rejects_duplicates_and_zero_quota() {
        let duplicate = r#"[
            {"host": "10.0.0.1", "port": 3128, "country_code": "US", "anonymity": "x", "https": false},
            {"host": "10.0.0.1", "port": 3128, "country_code": "US", "anonymity": "x", "https": true}
        ]"#;
        assert!(ProxyPool::from_json_str(duplicate).is_err());

        let zero_quota = r#"[
            {"host": "10.0.0.1", "port": 3128, "country_code": "US", "anonymity": "x",
             "https": false, "requests_per_second": 0}
        ]"#;
        assert!(ProxyPool::from_json_str(zero_quota).is_err());
    }

    #[test]
    fn test_pool_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIST.as_bytes()).unwrap();

        let pool = ProxyPool::load(file.path()).unwrap();
        assert_eq!(pool.size(), 2);

        let missing = ProxyPool::load("/nonexistent/proxies.json").unwrap_err();
        assert!(matches!(missing, ScraperError::ProxyList(_)));
    }
}
