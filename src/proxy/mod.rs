//! Proxy-side machinery
//!
//! This module provides:
//! - The immutable proxy pool loaded at startup
//! - Per-proxy quota checks against the shared counter store
//! - Proxy selection strategies
//! - The retrying fetcher and its upstream HTTP transport

pub mod pool;
pub mod rate_limit;
pub mod rotation;
pub mod scraper;
pub mod transport;

pub use pool::ProxyPool;
pub use rate_limit::RateLimiter;
pub use rotation::{create_selector, ProbeStrategy, ProxySelector};
pub use scraper::Scraper;
pub use transport::{ReqwestClient, UpstreamClient, UpstreamResponse};
