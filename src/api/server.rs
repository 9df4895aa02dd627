//! API server using Axum
//!
//! Exposes the scrape endpoint and a health check.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{header, HeaderValue};
use axum::Router;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Result, ScraperError};
use crate::proxy::Scraper;
use crate::store::CounterStore;

use super::middleware::RequestLogging;
use super::routes;

/// Maximum accepted request body
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub store: Arc<dyn CounterStore>,
    pub config: Config,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(scraper: Arc<Scraper>, store: Arc<dyn CounterStore>, config: Config) -> Self {
        Self {
            scraper,
            store,
            config,
            started_at: Instant::now(),
        }
    }
}

/// API server
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with every middleware layer applied
    pub fn build_router(state: AppState) -> Router {
        routes::create_router(state)
            .layer(axum::middleware::from_fn(RequestLogging::log_request))
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
            .layer(CompressionLayer::new())
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = self.state.config.server_addr().parse().map_err(|e| {
            ScraperError::InvalidConfig(format!(
                "Invalid API server address {}: {}",
                self.state.config.server_addr(),
                e
            ))
        })?;

        let router = Self::build_router(self.state.clone());

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| ScraperError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}
