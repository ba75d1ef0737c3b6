// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Backend-as-a-service layer.
//!
//! [`Backend`] is the whole collaborator surface the screens consume:
//! table-scoped reads, inserts, updates and deletes with row-level access
//! decided by the caller's access token, plus the auth subsystem.
//! Rows travel as JSON; the helpers at the bottom decode them into models.

pub mod memory;
pub mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{AppError, Result};
use crate::models::Session;

/// Table names as constants.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const CLUBS: &str = "clubs";
    pub const CLUB_MEMBERSHIPS: &str = "club_memberships";
    pub const CHALLENGES: &str = "challenges";
    pub const USER_CHALLENGES: &str = "user_challenges";
    /// Read-only aggregate view, recomputed server-side
    pub const LEADERBOARD: &str = "leaderboard";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Equality filters, ordering and limit for a table read or delete.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order: Vec<(String, Order)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }

    /// Sort rows by the ordering columns, then truncate to the limit.
    pub fn apply_order_and_limit(&self, rows: &mut Vec<Value>) {
        if !self.order.is_empty() {
            rows.sort_by(|a, b| {
                for (column, order) in &self.order {
                    let ord = compare_values(
                        a.get(column).unwrap_or(&Value::Null),
                        b.get(column).unwrap_or(&Value::Null),
                        *order,
                    );
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
    }
}

/// Compare two column values; nulls sort last in either direction.
fn compare_values(a: &Value, b: &Value, order: Order) -> Ordering {
    let ord = match (a, b) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Greater,
        (_, Value::Null) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    };
    match order {
        Order::Asc => ord,
        Order::Desc => ord.reverse(),
    }
}

/// Backend collaborator surface.
///
/// Data operations take the caller's access token; the backend applies
/// row-level access based on the identity inside it.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read rows matching `query`. `None` reads anonymously.
    async fn select(
        &self,
        table: &str,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>>;

    /// Insert a row and return it as stored. Uniqueness violations surface
    /// as [`AppError::Conflict`].
    async fn insert(&self, table: &str, record: Value, access_token: &str) -> Result<Value>;

    /// Patch the row with the given `id` and return it as stored.
    async fn update(&self, table: &str, id: &str, patch: Value, access_token: &str)
        -> Result<Value>;

    /// Delete every row matching `query` (e.g. a `(user, resource)` key).
    async fn delete(&self, table: &str, query: &Query, access_token: &str) -> Result<()>;

    /// Resolve the session behind an access token, `None` when it is not live.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> Result<T> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Backend(format!("Malformed {} row: {}", table, e)))
}

fn encode_row<T: Serialize>(table: &str, record: &T) -> Result<Value> {
    serde_json::to_value(record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Cannot encode {} row: {}", table, e)))
}

/// Typed [`Backend::select`].
pub async fn fetch_rows<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    query: &Query,
    access_token: Option<&str>,
) -> Result<Vec<T>> {
    backend
        .select(table, query, access_token)
        .await?
        .into_iter()
        .map(|row| decode_row(table, row))
        .collect()
}

/// Typed [`Backend::insert`].
pub async fn insert_row<T: Serialize + DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    record: &T,
    access_token: &str,
) -> Result<T> {
    let stored = backend
        .insert(table, encode_row(table, record)?, access_token)
        .await?;
    decode_row(table, stored)
}

/// Typed [`Backend::update`].
pub async fn update_row<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    id: &str,
    patch: Value,
    access_token: &str,
) -> Result<T> {
    let stored = backend.update(table, id, patch, access_token).await?;
    decode_row(table, stored)
}
