// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Home screen route.

use axum::{routing::get, Extension, Json, Router};
use std::sync::Arc;

use crate::screens::home::{self, HomeView};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_home))
}

async fn get_home(Extension(ctx): Extension<SessionContext>) -> Json<HomeView> {
    Json(home::view(&ctx.user))
}
