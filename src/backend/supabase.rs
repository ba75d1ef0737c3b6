// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Hosted backend client.
//!
//! Handles:
//! - Table reads/writes through the REST layer (`/rest/v1/{table}`)
//! - Password sign-in, sign-up, session lookup and sign-out (`/auth/v1`)
//! - Mapping of backend error bodies to [`AppError`]

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{Backend, Order, Query};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Session, User};

/// Hosted backend client.
#[derive(Clone)]
pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Error body returned by either the REST or the auth layer.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(code)) => Some(code.clone()),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        }
    }

    fn message(self, fallback: String) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthUserMetadata {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: AuthUserMetadata,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: user.user_metadata.display_name,
        }
    }
}

/// Token/sign-up response. Sign-up without auto-confirm omits the tokens.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session> {
        match (self.access_token, self.user) {
            (Some(access_token), Some(user)) => Ok(Session {
                access_token,
                refresh_token: self.refresh_token,
                expires_at: self.expires_at,
                user: user.into(),
            }),
            _ => Err(AppError::Auth(
                "Check your email to confirm your account, then log in.".to_string(),
            )),
        }
    }
}

/// Render a filter value the way the REST layer expects after `eq.`.
fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the REST query string for a read or delete.
pub fn build_query_string(query: &Query, select: bool) -> String {
    let mut params: Vec<String> = Vec::new();
    if select {
        params.push("select=*".to_string());
    }
    for (column, value) in &query.filters {
        params.push(format!(
            "{}=eq.{}",
            urlencoding::encode(column),
            urlencoding::encode(&filter_value(value))
        ));
    }
    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|(column, order)| {
                let dir = match order {
                    Order::Asc => "asc",
                    Order::Desc => "desc",
                };
                format!("{}.{}", urlencoding::encode(column), dir)
            })
            .collect();
        params.push(format!("order={}", order.join(",")));
    }
    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }
    params.join("&")
}

impl SupabaseBackend {
    /// Create a client for the configured project.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        access_token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }

    /// Check a REST response; uniqueness violations become [`AppError::Conflict`].
    async fn check_rest(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        if status.as_u16() == 401 {
            tracing::warn!(status = %status, "Backend rejected access token");
            return Err(AppError::Unauthorized);
        }
        let code = body.code();
        let message = body.message(format!("HTTP {}", status));
        tracing::warn!(status = %status, code = ?code, error = %message, "Backend request failed");
        Err(AppError::from_backend(code.as_deref(), message))
    }

    /// Check an auth response; failures carry the backend's message verbatim.
    async fn check_auth(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body.message(format!("Authentication failed (HTTP {})", status));
        tracing::warn!(status = %status, error = %message, "Backend auth request failed");
        Err(AppError::Auth(message))
    }

    /// Representation-returning writes answer with a one-row array.
    async fn single_row(&self, response: reqwest::Response, table: &str) -> Result<Value> {
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid {} response: {}", table, e)))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} row", table)))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn select(
        &self,
        table: &str,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}?{}", self.rest_url(table), build_query_string(query, true));
        let response = self
            .request(reqwest::Method::GET, &url, access_token)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_rest(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid {} response: {}", table, e)))
    }

    async fn insert(&self, table: &str, record: Value, access_token: &str) -> Result<Value> {
        let response = self
            .request(reqwest::Method::POST, &self.rest_url(table), Some(access_token))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let response = self.check_rest(response).await?;
        self.single_row(response, table).await
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: &str,
    ) -> Result<Value> {
        let url = format!("{}?id=eq.{}", self.rest_url(table), urlencoding::encode(id));
        let response = self
            .request(reqwest::Method::PATCH, &url, Some(access_token))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let response = self.check_rest(response).await?;
        self.single_row(response, table).await
    }

    async fn delete(&self, table: &str, query: &Query, access_token: &str) -> Result<()> {
        if query.filters.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Refusing unfiltered delete on {}",
                table
            )));
        }

        let url = format!("{}?{}", self.rest_url(table), build_query_string(query, false));
        let response = self
            .request(reqwest::Method::DELETE, &url, Some(access_token))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_rest(response).await?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>> {
        let response = self
            .request(reqwest::Method::GET, &self.auth_url("user"), Some(access_token))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        if matches!(response.status().as_u16(), 401 | 403) {
            return Ok(None);
        }

        let user: AuthUser = self
            .check_auth(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid user response: {}", e)))?;

        Ok(Some(Session {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: None,
            user: user.into(),
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_url("token?grant_type=password"),
                None,
            )
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let auth: AuthResponse = self
            .check_auth(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid token response: {}", e)))?;

        auth.into_session()
    }

    /// The project's `on_auth_user_created` trigger inserts the profile row
    /// from `user_metadata.display_name` in the same transaction, so a taken
    /// name rejects the whole sign-up.
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session> {
        let response = self
            .request(reqwest::Method::POST, &self.auth_url("signup"), None)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "display_name": display_name },
            }))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let auth: AuthResponse = self
            .check_auth(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid sign-up response: {}", e)))?;

        auth.into_session()
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, &self.auth_url("logout"), Some(access_token))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        // An already-expired token is as signed out as it gets.
        if matches!(response.status().as_u16(), 401 | 403) {
            return Ok(());
        }
        self.check_auth(response).await?;
        Ok(())
    }
}
