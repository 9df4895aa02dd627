//! Scrape endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::{info_span, Instrument};
use url::Url;
use uuid::Uuid;

use crate::api::middleware::RequestId;
use crate::api::server::AppState;
use crate::error::{FieldError, Result, ScraperError};
use crate::models::{ScrapeRequest, ScrapeResponse};

/// Check the `url` field and return it trimmed
///
/// The URL must be present, parse as an absolute URL, and use http or https.
pub fn validate_url(raw: Option<&str>) -> Result<String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return Err(ScraperError::Validation(vec![FieldError::new(
                "url",
                "URL is required",
                None,
            )]))
        }
    };

    let parsed = Url::parse(raw).map_err(|_| {
        ScraperError::Validation(vec![FieldError::new(
            "url",
            "Must be a valid URL",
            Some(raw),
        )])
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScraperError::Validation(vec![FieldError::new(
            "url",
            "URL must use http or https",
            Some(raw),
        )]));
    }

    Ok(raw.to_string())
}

/// Fetch a page through the proxy pool
pub async fn scrape(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let redact = state.config.is_production();
    let request_id = request_id
        .map(|Extension(id)| id.0)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return ScraperError::Validation(vec![FieldError::new(
                "body",
                &rejection.body_text(),
                None,
            )])
            .to_response(redact)
        }
    };

    let url = match validate_url(request.url.as_deref()) {
        Ok(url) => url,
        Err(e) => return e.to_response(redact),
    };

    let span = info_span!("scrape", request_id = %request_id, url = %url);
    match state.scraper.fetch(&url).instrument(span).await {
        Ok(result) => (StatusCode::OK, Json(ScrapeResponse::from(result))).into_response(),
        Err(e) => e.to_response(redact),
    }
}
