// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Auth screen and sign-in/sign-up/sign-out routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::session::{access_token, expired_session_cookie, session_cookie, AUTH_PATH};
use crate::screens::auth::{self, AuthMode};
use crate::session::{SessionHolder, SignInForm, SignUpForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(AUTH_PATH, get(auth_screen))
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct AuthScreenParams {
    #[serde(default)]
    mode: AuthMode,
}

/// Auth form, or straight home when already signed in.
async fn auth_screen(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<AuthScreenParams>,
) -> Result<Response> {
    let holder = SessionHolder::new(state.backend.clone());
    if holder
        .restore(access_token(&jar, &headers).as_deref())
        .await?
        .is_some()
    {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(Json(auth::view(params.mode)).into_response())
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<SignInForm>,
) -> Result<(CookieJar, Redirect)> {
    let holder = SessionHolder::new(state.backend.clone());
    let session = holder.sign_in(&form).await?;

    let jar = jar.add(session_cookie(&state.config, session.access_token));
    Ok((jar, Redirect::to("/")))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<SignUpForm>,
) -> Result<(CookieJar, Redirect)> {
    let holder = SessionHolder::new(state.backend.clone());
    let session = holder.sign_up(&form).await?;

    let jar = jar.add(session_cookie(&state.config, session.access_token));
    Ok((jar, Redirect::to("/")))
}

/// Sign out with the backend, drop the user's screens and the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Redirect)> {
    let holder = SessionHolder::new(state.backend.clone());
    if let Some(user) = holder.restore(access_token(&jar, &headers).as_deref()).await? {
        holder.sign_out().await?;
        state.screens.forget(&user.id);
        tracing::info!(user_id = %user.id, "Signed out");
    }

    let jar = jar.add(expired_session_cookie(&state.config));
    Ok((jar, Redirect::to(AUTH_PATH)))
}
