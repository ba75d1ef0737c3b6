// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Client-side form validation, caught before any backend request.
    #[error("{0}")]
    Validation(String),

    /// Backend uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// Backend auth subsystem rejected the request; message is user-facing.
    #[error("{0}")]
    Auth(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// PostgreSQL `unique_violation`, as reported by the backend's REST layer.
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    /// Message shown when a display name is already registered.
    pub const DISPLAY_NAME_TAKEN: &'static str =
        "That display name is already taken. Please choose another one.";

    /// Map a backend error code + message to the matching variant.
    pub fn from_backend(code: Option<&str>, message: impl Into<String>) -> Self {
        match code {
            Some(Self::UNIQUE_VIOLATION) => AppError::Conflict(message.into()),
            _ => AppError::Backend(message.into()),
        }
    }

    /// Whether this error came from a uniqueness constraint.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "auth_error", Some(msg.clone())),
            AppError::Backend(msg) => {
                tracing::error!(error = %msg, "Backend error");
                (StatusCode::BAD_GATEWAY, "backend_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
