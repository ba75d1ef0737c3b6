// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. The hosted backend
//! credentials are only required when `BACKEND=supabase`.

use std::env;
use std::time::Duration;

/// Session cookie carrying the backend-issued access token.
pub const SESSION_COOKIE: &str = "tc_token";

/// Which backend implementation the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted backend-as-a-service (REST + auth over HTTPS).
    Supabase,
    /// In-process backend seeded from a JSON file (local dev, tests).
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend selection
    pub backend: BackendKind,
    /// Base URL of the hosted backend project (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key sent as `apikey` on every backend request
    pub supabase_anon_key: String,
    /// Secret used to sign/verify HS256 access tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Seed file for the in-process backend
    pub seed_path: String,
    /// Upper bound on a single backend round trip
    pub backend_timeout: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            backend: BackendKind::Memory,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            seed_path: "data/seed.json".to_string(),
            backend_timeout: Duration::from_secs(10),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend: BackendKind = env::var("BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let (supabase_url, supabase_anon_key) = match backend {
            BackendKind::Supabase => (
                env::var("SUPABASE_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
                env::var("SUPABASE_ANON_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            ),
            BackendKind::Memory => (String::new(), String::new()),
        };

        let timeout_secs = match env::var("BACKEND_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("BACKEND_TIMEOUT_SECS", raw))?,
            Err(_) => 10,
        };

        Ok(Self {
            backend,
            supabase_url,
            supabase_anon_key,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            seed_path: env::var("SEED_PATH").unwrap_or_else(|_| "data/seed.json".to_string()),
            backend_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
