// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! TeenConnect API Server
//!
//! Serves the clubs and challenges screens over a hosted
//! backend-as-a-service, or over the in-process backend for local work.

use std::sync::Arc;
use teenconnect::{
    backend::{Backend, MemoryBackend, SupabaseBackend},
    config::{BackendKind, Config},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.backend, "Starting TeenConnect API");

    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Supabase => {
            tracing::info!(url = %config.supabase_url, "Using hosted backend");
            Arc::new(SupabaseBackend::new(&config)?)
        }
        BackendKind::Memory => {
            tracing::info!(path = %config.seed_path, "Using in-memory backend");
            Arc::new(MemoryBackend::with_seed_file(
                &config.jwt_secret,
                &config.seed_path,
            )?)
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), backend));

    // Build router
    let app = teenconnect::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("teenconnect=debug,info")),
        )
        .with(format)
        .init();
}
