//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::api::server::AppState;

/// Health check endpoint
///
/// Always answers 200; a failed backend ping is reported in `services` rather than as an error,
/// since scrapes keep working while the counter backend is down.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let counter_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!(
                "Counter backend {} health check failed: {}",
                state.store.backend_name(),
                e
            );
            "disconnected"
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "API is running",
            "environment": state.config.environment,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptimeSeconds": state.started_at.elapsed().as_secs(),
            "services": {
                "counter_backend": counter_status,
                "backend": state.store.backend_name(),
            }
        })),
    )
}
