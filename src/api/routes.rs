//! API route definitions

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/scraper/scrape", post(handlers::scrape::scrape))
        .with_state(state)
}
