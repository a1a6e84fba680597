// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Garmin Connect authentication failed: {0}")]
    Auth(String),

    #[error("Not authenticated with Garmin Connect")]
    NotAuthenticated,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<crate::odata::QueryError> for AppError {
    fn from(err: crate::odata::QueryError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::services::transform::TransformError> for AppError {
    fn from(err: crate::services::transform::TransformError) -> Self {
        AppError::Transform(err.to_string())
    }
}

impl From<crate::services::garmin::GarminError> for AppError {
    fn from(err: crate::services::garmin::GarminError) -> Self {
        use crate::services::garmin::GarminError;
        match err {
            GarminError::Auth(msg) => AppError::Auth(msg),
            GarminError::NotAuthenticated => AppError::NotAuthenticated,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream request failed");
                StatusCode::BAD_GATEWAY
            }
            AppError::Auth(_) | AppError::NotAuthenticated => StatusCode::BAD_GATEWAY,
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Transform(msg) => {
                tracing::error!(error = %msg, "Transform error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Config(err) => {
                tracing::error!(error = %err, "Configuration error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
