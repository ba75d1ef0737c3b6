// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

use axum::{http::StatusCode, response::IntoResponse};
use teenconnect::error::AppError;

#[test]
fn test_unique_violation_maps_to_conflict() {
    let err = AppError::from_backend(Some(AppError::UNIQUE_VIOLATION), "duplicate key");
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "duplicate key");
}

#[test]
fn test_other_backend_codes_are_not_conflicts() {
    let err = AppError::from_backend(Some("42501"), "permission denied");
    assert!(!err.is_conflict());
    assert!(matches!(err, AppError::Backend(_)));

    let err = AppError::from_backend(None, "boom");
    assert!(!err.is_conflict());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Conflict("x".into()), StatusCode::CONFLICT),
        (AppError::Auth("x".into()), StatusCode::UNAUTHORIZED),
        (AppError::Backend("x".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let label = format!("{err:?}");
        assert_eq!(err.into_response().status(), status, "{label}");
    }
}

#[tokio::test]
async fn test_error_body_shape() {
    let response = AppError::Conflict(AppError::DISPLAY_NAME_TAKEN.to_string()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "conflict");
    assert_eq!(body["details"], AppError::DISPLAY_NAME_TAKEN);
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let response = AppError::Internal(anyhow::anyhow!("secret path")).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}
