use crate::error::{Result, ScraperError};
use crate::proxy::rotation::ProbeStrategy;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment (development, production, test)
    pub environment: String,
    /// API server configuration
    pub server: ServerConfig,
    /// Path to the JSON proxy list
    pub proxy_list_path: String,
    /// Counter backend configuration
    pub counter: CounterConfig,
    /// Fetch and retry configuration
    pub scraper: ScraperConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port for the API server (default: 3000)
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub backend: CounterBackend,
    /// Redis connection URL, used when `backend` is `Redis`
    pub redis_url: String,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Total fetch attempts per scrape, each through a different proxy
    pub max_attempts: u32,
    /// Selector calls allowed per attempt before giving up on finding an untried proxy
    pub max_selection_attempts: u32,
    /// Timeout for a single upstream request
    pub request_timeout: Duration,
    /// Backoff unit; the delay after attempt `n` is `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// How the selector probes the pool
    pub probe_strategy: ProbeStrategy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_selection_attempts: 10,
            request_timeout: Duration::from_secs(10),
            retry_base_delay: Duration::from_millis(1000),
            probe_strategy: ProbeStrategy::BoundedRandom,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let backend = match get_env_or("COUNTER_BACKEND", "redis").to_lowercase().as_str() {
            "redis" => CounterBackend::Redis,
            "memory" => CounterBackend::Memory,
            other => {
                return Err(ScraperError::InvalidConfig(format!(
                    "COUNTER_BACKEND must be redis or memory, got {}",
                    other
                )))
            }
        };

        let max_attempts = parse_env::<u32>("SCRAPER_MAX_ATTEMPTS", "3")?;
        if max_attempts == 0 {
            return Err(ScraperError::InvalidConfig(
                "SCRAPER_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        let max_selection_attempts = parse_env::<u32>("SCRAPER_MAX_SELECTION_ATTEMPTS", "10")?;
        if max_selection_attempts == 0 {
            return Err(ScraperError::InvalidConfig(
                "SCRAPER_MAX_SELECTION_ATTEMPTS must be at least 1".into(),
            ));
        }

        Ok(Config {
            environment: get_env_or("APP_ENV", "development"),
            server: ServerConfig {
                host: get_env_or("HOST", "0.0.0.0"),
                port: get_env_or("PORT", "3000").parse().map_err(|_| {
                    ScraperError::InvalidConfig("PORT must be a valid port number".into())
                })?,
            },
            proxy_list_path: get_env_or("PROXY_LIST_PATH", "proxies.json"),
            counter: CounterConfig {
                backend,
                redis_url: get_env_or("REDIS_URL", "redis://localhost:6379"),
            },
            scraper: ScraperConfig {
                max_attempts,
                max_selection_attempts,
                request_timeout: Duration::from_secs(parse_env("SCRAPER_REQUEST_TIMEOUT", "10")?),
                retry_base_delay: Duration::from_millis(parse_env(
                    "SCRAPER_RETRY_BASE_DELAY_MS",
                    "1000",
                )?),
                probe_strategy: ProbeStrategy::from_str(&get_env_or(
                    "SCRAPER_PROBE_STRATEGY",
                    "random",
                )),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "json"),
            },
        })
    }

    /// Get the API server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether error details should be hidden from API clients
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    get_env_or(key, default)
        .trim()
        .parse()
        .map_err(|_| ScraperError::InvalidConfig(format!("{} must be a valid number", key)))
}
