// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Session gate middleware and session cookie helpers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, SESSION_COOKIE};
use crate::session::{gate, Gate, SessionHolder};
use crate::AppState;

/// Path of the auth screen unauthenticated requests are sent to.
pub const AUTH_PATH: &str = "/auth";

/// Shown while the session is still being resolved.
#[derive(Serialize)]
pub struct LoadingView {
    pub screen: &'static str,
}

/// Access token from the session cookie, falling back to a Bearer header.
pub fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn secure_cookies(config: &Config) -> bool {
    config.frontend_url.starts_with("https://")
}

/// Session cookie carrying a freshly issued access token.
pub fn session_cookie(config: &Config, access_token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .build()
}

/// Removal counterpart of [`session_cookie`], with matching attributes.
pub fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .max_age(time::Duration::ZERO)
        .build()
}

/// Resolve the caller's session and route accordingly:
/// loading -> loading view, no session -> auth screen, session -> handler
/// with a [`crate::session::SessionContext`] extension.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = access_token(&jar, request.headers());

    let holder = SessionHolder::new(state.backend.clone());
    if let Err(e) = holder.restore(token.as_deref()).await {
        tracing::warn!(error = %e, "Session lookup failed");
        return e.into_response();
    }

    match gate(&holder.state()) {
        // `restore` has resolved by now; this arm only serves holders
        // observed mid-restore, which this per-request holder never is.
        Gate::Loading => Json(LoadingView { screen: "loading" }).into_response(),
        Gate::SignIn => {
            if token.is_some() {
                tracing::debug!("Stale session token, clearing cookie");
                let jar = jar.add(expired_session_cookie(&state.config));
                return (jar, Redirect::to(AUTH_PATH)).into_response();
            }
            Redirect::to(AUTH_PATH).into_response()
        }
        Gate::Render(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
    }
}
