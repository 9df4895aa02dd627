use serde::{Deserialize, Serialize};

/// Key prefix for per-proxy request counters in the counter store
pub const RATE_LIMIT_KEY_PREFIX: &str = "rate_limit";

/// Forward proxy entry from the proxy list
///
/// Identity is `(host, port)`; every other field is descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(alias = "ip_address")]
    pub host: String,
    pub port: u16,
    #[serde(alias = "code")]
    pub country_code: String,
    #[serde(default)]
    pub country: Option<String>,
    pub anonymity: String,
    #[serde(default)]
    pub google: Option<bool>,
    /// Proxy accepts CONNECT tunnels to HTTPS targets
    pub https: bool,
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl Proxy {
    /// Identity string, `host:port`
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Counter store key for this proxy's request window
    pub fn rate_limit_key(&self) -> String {
        format!("{}:{}:{}", RATE_LIMIT_KEY_PREFIX, self.host, self.port)
    }

    /// Requests allowed per one-second window; 1 when the list omits it
    pub fn requests_per_second(&self) -> u64 {
        self.requests_per_second.map(u64::from).unwrap_or(1)
    }

    /// Proxy URL handed to the HTTP client.
    ///
    /// The client always talks plain HTTP to the proxy; HTTPS targets go through CONNECT.
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// Country to report to clients, preferring the full name
    pub fn display_country(&self) -> &str {
        self.country.as_deref().unwrap_or(&self.country_code)
    }
}

impl std::fmt::Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_proxy() -> Proxy {
        Proxy {
            host: "173.209.63.70".to_string(),
            port: 8040,
            country_code: "CA".to_string(),
            country: Some("Canada".to_string()),
            anonymity: "anonymous".to_string(),
            google: None,
            https: true,
            requests_per_second: None,
        }
    }

    #[test]
    fn test_proxy_identity_and_keys() {
        let proxy = base_proxy();
        assert_eq!(proxy.key(), "173.209.63.70:8040");
        assert_eq!(proxy.rate_limit_key(), "rate_limit:173.209.63.70:8040");
        assert_eq!(proxy.to_string(), "173.209.63.70:8040");
    }

    #[test]
    fn test_requests_per_second_defaults_to_one() {
        let mut proxy = base_proxy();
        assert_eq!(proxy.requests_per_second(), 1);

        proxy.requests_per_second = Some(5);
        assert_eq!(proxy.requests_per_second(), 5);
    }

    #[test]
    fn test_proxy_url_uses_http_scheme() {
        let mut proxy = base_proxy();
        assert_eq!(proxy.url(), "http://173.209.63.70:8040");

        proxy.https = false;
        assert_eq!(proxy.url(), "http://173.209.63.70:8040");

        proxy.host = "::1".to_string();
        assert_eq!(proxy.url(), "http://[::1]:8040");
    }

    #[test]
    fn test_proxy_deserializes_list_field_names() {
        let proxy: Proxy = serde_json::from_str(
            r#"{
                "ip_address": "10.0.0.1",
                "port": 3128,
                "code": "US",
                "country": "United States",
                "anonymity": "elite proxy",
                "google": null,
                "https": false,
                "requests_per_second": 3
            }"#,
        )
        .unwrap();

        assert_eq!(proxy.host, "10.0.0.1");
        assert_eq!(proxy.country_code, "US");
        assert_eq!(proxy.display_country(), "United States");
        assert_eq!(proxy.google, None);
        assert_eq!(proxy.requests_per_second(), 3);
    }

    #[test]
    fn test_display_country_falls_back_to_code() {
        let mut proxy = base_proxy();
        proxy.country = None;
        assert_eq!(proxy.display_country(), "CA");
    }
}
