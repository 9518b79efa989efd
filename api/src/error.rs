//! Unified error types for the XRSS API
//!
//! This module defines error types for each layer:
//! - `UpstreamError`: Upstream (X gateway) client errors
//! - `CacheError`: Cache store errors
//! - `RefreshError`: Refresh coordinator errors (what one refresh invocation saw)
//! - `AppError`: Application layer errors (wraps the above for HTTP responses)

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Upstream client errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized - session rejected")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Login failed: {0}")]
    Login(String),
}

/// Cache store errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Unavailable(e.to_string())
    }
}

/// Errors surfaced by a single refresh invocation
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(UpstreamError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<UpstreamError> for RefreshError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotFound(handle) => RefreshError::NotFound(handle),
            other => RefreshError::Upstream(other),
        }
    }
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Refresh(#[from] RefreshError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Refresh(RefreshError::NotFound(handle)) => {
                (StatusCode::NOT_FOUND, "User not found", Some(handle.clone()))
            }
            AppError::Refresh(RefreshError::Upstream(e)) => {
                tracing::error!("Upstream error: {}", e);
                match e {
                    UpstreamError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out", None)
                    }
                    UpstreamError::RateLimited => {
                        (StatusCode::SERVICE_UNAVAILABLE, "Upstream rate limited", None)
                    }
                    _ => (StatusCode::BAD_GATEWAY, "Upstream service error", None),
                }
            }
            AppError::Refresh(RefreshError::Cache(e)) => {
                tracing::error!("Cache error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Cache unavailable", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
