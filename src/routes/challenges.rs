// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Challenges screen routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::screens::challenges::{ChallengesView, LeaderboardRow};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/challenges", get(get_challenges))
        .route("/challenges/leaderboard", get(get_leaderboard))
        .route("/challenges/{id}/accept", post(accept_challenge))
        .route("/challenges/{id}/proof", post(submit_proof))
}

/// Mount the screen: reload challenges, attempts and leaderboard.
async fn get_challenges(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<ChallengesView>> {
    let screen = state.screens.challenges(&state.backend, &ctx);
    screen.load().await?;
    Ok(Json(screen.view().await))
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<LeaderboardRow>>> {
    let screen = state.screens.challenges(&state.backend, &ctx);
    screen.ensure_loaded().await?;
    screen.refresh_leaderboard().await?;
    Ok(Json(screen.view().await.leaderboard))
}

async fn accept_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengesView>> {
    let screen = state.screens.challenges(&state.backend, &ctx);
    screen.ensure_loaded().await?;
    screen.accept(&challenge_id).await?;
    Ok(Json(screen.view().await))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProofRequest {
    /// Image link or other evidence; blank means "confirmed"
    #[serde(default)]
    proof_url: Option<String>,
}

async fn submit_proof(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(challenge_id): Path<String>,
    body: Option<Json<ProofRequest>>,
) -> Result<Json<ChallengesView>> {
    let Json(request) = body.unwrap_or_default();

    let screen = state.screens.challenges(&state.backend, &ctx);
    screen.ensure_loaded().await?;
    screen
        .submit_proof(&challenge_id, request.proof_url.as_deref())
        .await?;
    Ok(Json(screen.view().await))
}
