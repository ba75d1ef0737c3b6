// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Session gate, auth flow and CORS tests.
//!
//! These tests verify that:
//! 1. Screen routes redirect to the auth screen without a live session
//! 2. Sign-up and sign-in establish a session the screens accept
//! 3. Form and uniqueness errors surface with the right status and message
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use teenconnect::error::AppError;

mod common;

#[tokio::test]
async fn test_screen_routes_redirect_without_session() {
    let (app, _, _) = common::create_test_app();

    for uri in ["/", "/clubs", "/challenges", "/challenges/leaderboard"] {
        let response = common::send(&app, common::get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(common::location(&response), "/auth", "{uri}");
        assert!(common::set_cookie_headers(&response).is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_token_redirects_and_clears_cookie() {
    let (app, _, _) = common::create_test_app();

    let response = common::send(&app, common::get("/clubs", Some("tc_token=not-a-jwt"))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/auth");
    let cookies = common::set_cookie_headers(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("tc_token=") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_bearer_header_accepted() {
    let (app, _, _) = common::create_test_app();
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;
    let token = cookie.trim_start_matches("tc_token=");

    let response = common::send(
        &app,
        Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_then_home_shows_display_name() {
    let (app, _, backend) = common::create_test_app();
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(&app, common::get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::json_body(response).await;
    assert_eq!(body["title"], "Welcome to TeenConnect!");
    assert_eq!(body["display_name"], "Ana");
    assert_eq!(body["links"][0]["path"], "/clubs");
    assert_eq!(body["links"][1]["path"], "/challenges");

    // Profile row written alongside the auth user
    assert_eq!(backend.row_count("profiles"), 1);
}

#[tokio::test]
async fn test_login_after_signup() {
    let (app, _, _) = common::create_test_app();
    common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(
        &app,
        common::post_json(
            "/auth/login",
            None,
            json!({"email": "ana@example.com", "password": "secret123"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/");
    assert!(common::set_cookie_headers(&response)
        .iter()
        .any(|c| c.starts_with("tc_token=")));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _, _) = common::create_test_app();
    common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(
        &app,
        common::post_json(
            "/auth/login",
            None,
            json!({"email": "ana@example.com", "password": "wrong-password"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "auth_error");
    assert_eq!(body["details"], "Invalid login credentials");
}

#[tokio::test]
async fn test_signup_blank_display_name_rejected() {
    let (app, _, backend) = common::create_test_app();

    let response = common::send(
        &app,
        common::post_json(
            "/auth/signup",
            None,
            json!({"email": "ana@example.com", "password": "secret123", "display_name": "   "}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"], "Please enter a display name");
    assert_eq!(backend.row_count("profiles"), 0);
}

#[tokio::test]
async fn test_signup_duplicate_display_name_rejected() {
    let (app, _, backend) = common::create_test_app();
    common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(
        &app,
        common::post_json(
            "/auth/signup",
            None,
            json!({"email": "other@example.com", "password": "secret123", "display_name": "Ana"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(common::set_cookie_headers(&response).is_empty());
    let body = common::json_body(response).await;
    assert_eq!(body["details"], AppError::DISPLAY_NAME_TAKEN);
    assert_eq!(backend.row_count("profiles"), 1);
}

#[tokio::test]
async fn test_auth_screen_modes() {
    let (app, _, _) = common::create_test_app();

    let response = common::send(&app, common::get("/auth", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["mode"], "login");

    let response = common::send(&app, common::get("/auth?mode=signup", None)).await;
    let body = common::json_body(response).await;
    assert_eq!(body["mode"], "signup");
}

#[tokio::test]
async fn test_auth_screen_redirects_home_when_signed_in() {
    let (app, _, _) = common::create_test_app();
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(&app, common::get("/auth", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = common::create_test_app();

    let response = common::send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/clubs")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _, _) = common::create_test_app();

    let response = common::send(&app, common::get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = common::json_body(response).await;
    assert_eq!(body["status"], "ok");
}
