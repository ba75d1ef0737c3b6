// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Session cookie attribute tests.
//!
//! The removal cookie sent on sign-out must carry the same attributes as
//! the one set on sign-in, for both localhost and https frontends.

use axum::http::StatusCode;
use serde_json::json;

mod common;

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[tokio::test]
async fn test_signup_cookie_localhost_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = common::send(
        &app,
        common::post_json(
            "/auth/signup",
            None,
            json!({"email": "ana@example.com", "password": "secret123", "display_name": "Ana"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/");

    let cookie = find_cookie(&common::set_cookie_headers(&response), "tc_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(&app, common::post_empty("/auth/logout", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/auth");

    let removal = find_cookie(&common::set_cookie_headers(&response), "tc_token");
    assert!(removal.contains("Path=/"));
    assert!(removal.contains("HttpOnly"));
    assert!(removal.contains("SameSite=Lax"));
    assert!(removal.contains("Max-Age=0"));
    assert!(!removal.contains("Secure"));
    assert!(!removal.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_domain_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("https://teenconnect.example");
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(&app, common::post_empty("/auth/logout", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let removal = find_cookie(&common::set_cookie_headers(&response), "tc_token");
    assert!(removal.contains("Path=/"));
    assert!(removal.contains("HttpOnly"));
    assert!(removal.contains("SameSite=Lax"));
    assert!(removal.contains("Max-Age=0"));
    assert!(removal.contains("Secure"));
}

#[tokio::test]
async fn test_logout_without_session_still_clears_cookie() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = common::send(&app, common::post_empty("/auth/logout", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let removal = find_cookie(&common::set_cookie_headers(&response), "tc_token");
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_token_unusable_after_logout() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");
    let cookie = common::sign_up(&app, "ana@example.com", "Ana").await;

    let response = common::send(&app, common::get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    common::send(&app, common::post_empty("/auth/logout", Some(&cookie))).await;

    let response = common::send(&app, common::get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/auth");
}
