//! HTTP error responses.
//!
//! Every non-2xx body the gateway produces is shaped here.

use axum::{
    Json,
    extract::rejection::PathRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use folio_core::FolioError;

use crate::rate_limit::RateLimitResult;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limit exceeded")]
    RateLimited {
        result: RateLimitResult,
        retry_after_secs: u64,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FolioError> for ApiError {
    fn from(err: FolioError) -> Self {
        match err {
            FolioError::NotFound(what) => ApiError::NotFound(what),
            FolioError::Conflict(what) => ApiError::Conflict(what),
            FolioError::Storage(cause) => ApiError::Internal(cause),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(reason = %rejection.body_text(), "Rejected path parameter");
        ApiError::BadRequest("Invalid path parameter".to_string())
    }
}

pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(result.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(result.remaining));
    if let Ok(reset) = HeaderValue::from_str(&result.reset_at().to_rfc3339()) {
        headers.insert(RATE_LIMIT_RESET, reset);
    }
    headers
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited {
                result,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                rate_limit_headers(&result),
                Json(json!({
                    "error": "Too many requests. Please try again later.",
                    "retryAfter": retry_after_secs,
                })),
            )
                .into_response(),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "details": errors })),
            )
                .into_response(),
            ApiError::InvalidJson(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON body", "details": [] })),
            )
                .into_response(),
            ApiError::BadRequest(what) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": what }))).into_response()
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": what }))).into_response()
            }
            ApiError::Conflict(what) => {
                (StatusCode::CONFLICT, Json(json!({ "error": what }))).into_response()
            }
            ApiError::Internal(cause) => {
                error!(cause = %cause, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
