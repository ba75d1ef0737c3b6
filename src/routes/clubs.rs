// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Clubs screen routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::screens::clubs::{ClubsView, ALL_CATEGORIES};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clubs", get(get_clubs))
        .route("/clubs/{id}/join", post(join_club))
        .route("/clubs/{id}/leave", post(leave_club))
        .route("/clubs/{id}/toggle", post(toggle_club))
}

#[derive(Deserialize)]
pub struct ClubsQuery {
    /// Category filter; defaults to all
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    ALL_CATEGORIES.to_string()
}

/// Mount the screen: reload clubs and memberships, then render.
async fn get_clubs(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<ClubsQuery>,
) -> Result<Json<ClubsView>> {
    let screen = state.screens.clubs(&state.backend, &ctx);
    screen.load().await?;
    Ok(Json(screen.view(&params.category).await))
}

#[derive(Clone, Copy)]
enum Action {
    Join,
    Leave,
    Toggle,
}

async fn run_action(
    state: &AppState,
    ctx: &SessionContext,
    club_id: &str,
    category: &str,
    action: Action,
) -> Result<Json<ClubsView>> {
    let screen = state.screens.clubs(&state.backend, ctx);
    screen.ensure_loaded().await?;

    match action {
        Action::Join => screen.join(club_id).await?,
        Action::Leave => screen.leave(club_id).await?,
        Action::Toggle => screen.toggle(club_id).await?,
    }
    Ok(Json(screen.view(category).await))
}

async fn join_club(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(club_id): Path<String>,
    Query(params): Query<ClubsQuery>,
) -> Result<Json<ClubsView>> {
    run_action(&state, &ctx, &club_id, &params.category, Action::Join).await
}

async fn leave_club(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(club_id): Path<String>,
    Query(params): Query<ClubsQuery>,
) -> Result<Json<ClubsView>> {
    run_action(&state, &ctx, &club_id, &params.category, Action::Leave).await
}

async fn toggle_club(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(club_id): Path<String>,
    Query(params): Query<ClubsQuery>,
) -> Result<Json<ClubsView>> {
    run_action(&state, &ctx, &club_id, &params.category, Action::Toggle).await
}
