// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! TeenConnect: clubs and challenges for teens.
//!
//! This crate serves the browser-routed app shell. It gates every screen
//! on a backend session, keeps each user's screen state, and forwards all
//! reads and writes to a hosted backend-as-a-service.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod screens;
pub mod session;
pub mod time_utils;

use backend::Backend;
use config::Config;
use screens::ScreenStore;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub screens: ScreenStore,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            config,
            backend,
            screens: ScreenStore::new(),
        }
    }
}
