//! Proxy Scraper - web page fetching through a rotating proxy pool
//!
//! Every outbound request goes through a proxy picked from a fixed pool. Each proxy has a
//! requests-per-second quota tracked in a counter store shared by all instances, so several
//! processes can rotate the same pool without overrunning any proxy.
//!
//! ## Features
//!
//! - Per-proxy quotas over 1-second windows (Redis or in-process counters)
//! - Random probing for a proxy with quota left, never reusing one within a scrape
//! - Retries with linear backoff and a per-attempt timeout
//! - HTTP API with request validation and health reporting

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Result, ScraperError};
pub use proxy::{ProxyPool, RateLimiter, Scraper};
