//! API server implementation
//!
//! Provides the REST endpoints in front of the scraper.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
