//! Proxy Scraper - Entry Point
//!
//! Loads the proxy pool, connects the counter backend, and serves the API until shutdown.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxy_scraper::api::{ApiServer, AppState};
use proxy_scraper::config::{Config, LogConfig};
use proxy_scraper::proxy::{create_selector, ProxyPool, RateLimiter, ReqwestClient, Scraper};
use proxy_scraper::{error, store};

#[tokio::main]
async fn main() -> error::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    let dotenv = dotenvy::dotenv();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&config.log);
    info!("Starting Proxy Scraper ({})", config.environment);
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to load .env file: {}", e);
        }
    }

    // Load the proxy list; the service cannot run without it
    let pool = match ProxyPool::load(&config.proxy_list_path) {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(
                "Failed to load proxy list from {}: {}",
                config.proxy_list_path, e
            );
            return Err(e);
        }
    };
    info!("Loaded {} proxies", pool.size());

    // Connect to the counter backend
    let counter_store = store::connect(&config.counter).await?;
    info!("Using {} counter backend", counter_store.backend_name());

    let limiter = RateLimiter::new(counter_store.clone());
    let selector = create_selector(config.scraper.probe_strategy, pool.clone(), limiter.clone());
    info!(
        "Using probe strategy: {}",
        config.scraper.probe_strategy.as_str()
    );

    let client = Arc::new(ReqwestClient::new(config.scraper.request_timeout));
    let scraper = Arc::new(Scraper::new(
        selector,
        limiter,
        client,
        config.scraper.clone(),
    ));

    let api_server = ApiServer::new(AppState::new(scraper, counter_store, config.clone()));

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(shutdown_rx).await {
            error!("API server error: {}", e);
        }
    });

    info!("Server started on {}", config.server_addr());

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = api_task.await;

    info!("Proxy Scraper stopped");
    Ok(())
}

/// Install the global subscriber, JSON or human-readable per `LOG_FORMAT`
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("proxy_scraper={},tower_http=info", log.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if log.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
