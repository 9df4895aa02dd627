use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single rejected field in an inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn new(field: &str, message: &str, value: Option<&str>) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            value: value.map(str::to_string),
        }
    }
}

/// Unified error type for the scraper
#[derive(Error, Debug)]
pub enum ScraperError {
    // Selection errors
    #[error("You have hit the rate limit on all proxies")]
    RateLimitExhausted,

    #[error("Unable to find an unused proxy after {attempts} attempts")]
    NoUsableProxy { attempts: u32 },

    // Fetch errors
    #[error("Attempt {attempt} failed: {cause}")]
    FetchFailed { attempt: u32, cause: String },

    #[error("{0}")]
    Upstream(String),

    #[error("Failed to scrape {url} after {attempts} attempts. Last error: {last_cause}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_cause: String,
    },

    // Counter backend
    #[error("Counter backend unavailable: {0}")]
    BackendDegraded(String),

    // Request errors
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    // Startup errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid proxy list: {0}")]
    ProxyList(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

impl ScraperError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ScraperError::Validation(_) => StatusCode::BAD_REQUEST,

            // 429 Too Many Requests
            ScraperError::RateLimitExhausted => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway
            ScraperError::FetchFailed { .. }
            | ScraperError::Upstream(_)
            | ScraperError::FetchExhausted { .. } => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            ScraperError::NoUsableProxy { .. } | ScraperError::BackendDegraded(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            ScraperError::InvalidConfig(_)
            | ScraperError::ProxyList(_)
            | ScraperError::Io(_)
            | ScraperError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Render the error body, hiding internal details when `redact_internal` is set
    pub fn to_response(&self, redact_internal: bool) -> Response {
        let status = self.status_code();
        let message = if redact_internal && status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "success": false,
            "error": message,
            "statusCode": status.as_u16(),
        });
        if let ScraperError::Validation(fields) = self {
            body["validationErrors"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ScraperError {
    fn into_response(self) -> Response {
        self.to_response(false)
    }
}

impl From<redis::RedisError> for ScraperError {
    fn from(err: redis::RedisError) -> Self {
        ScraperError::BackendDegraded(err.to_string())
    }
}

impl From<url::ParseError> for ScraperError {
    fn from(err: url::ParseError) -> Self {
        ScraperError::Validation(vec![FieldError::new("url", &err.to_string(), None)])
    }
}
