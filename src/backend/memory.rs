// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! In-process backend for local development and tests.
//!
//! Behaves like the hosted backend where the screens can observe it:
//! - uniqueness constraints reported with code `23505`
//! - row-level access on user-owned tables
//! - the club member counter maintained by a trigger on memberships
//! - the leaderboard recomputed from completed attempts on every read

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

use super::{tables, Backend, Query};
use crate::auth;
use crate::error::{AppError, Result};
use crate::models::{Session, User};
use crate::time_utils::now_rfc3339;

/// Per-table access and constraint rules.
struct TableRules {
    /// Column sets that must be unique across rows
    unique: &'static [&'static [&'static str]],
    /// Column holding the owning user id
    owner: Option<&'static str>,
    /// Rows readable only by their owner
    private_rows: bool,
    /// Clients may insert/update/delete
    client_writable: bool,
}

fn rules(table: &str) -> Option<TableRules> {
    let rules = match table {
        tables::PROFILES => TableRules {
            unique: &[&["id"], &["display_name"]],
            owner: Some("id"),
            private_rows: false,
            client_writable: true,
        },
        tables::CLUBS | tables::CHALLENGES => TableRules {
            unique: &[&["id"]],
            owner: None,
            private_rows: false,
            client_writable: false,
        },
        tables::CLUB_MEMBERSHIPS => TableRules {
            unique: &[&["user_id", "club_id"]],
            owner: Some("user_id"),
            private_rows: true,
            client_writable: true,
        },
        tables::USER_CHALLENGES => TableRules {
            unique: &[&["id"], &["user_id", "challenge_id"]],
            owner: Some("user_id"),
            private_rows: true,
            client_writable: true,
        },
        tables::LEADERBOARD => TableRules {
            unique: &[],
            owner: None,
            private_rows: false,
            client_writable: false,
        },
        _ => return None,
    };
    Some(rules)
}

fn unknown_table(table: &str) -> AppError {
    AppError::Backend(format!("relation \"{}\" does not exist", table))
}

fn read_only(table: &str) -> AppError {
    AppError::Backend(format!("permission denied for table {}", table))
}

struct StoredUser {
    user: User,
    salt: String,
    password_hash: String,
}

struct LiveSession {
    user_id: String,
    /// Unix timestamp after which the token no longer verifies
    expires_at: usize,
}

/// Seed file layout.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    clubs: Vec<Value>,
    #[serde(default)]
    challenges: Vec<Value>,
}

/// In-process backend.
pub struct MemoryBackend {
    jwt_secret: Vec<u8>,
    tables: DashMap<String, Vec<Value>>,
    /// Registered users keyed by normalized email
    users: DashMap<String, StoredUser>,
    /// Live access tokens
    sessions: DashMap<String, LiveSession>,
}

impl MemoryBackend {
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            jwt_secret: jwt_secret.to_vec(),
            tables: DashMap::new(),
            users: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    /// Create a backend pre-populated with clubs and challenges from a JSON file.
    pub fn with_seed_file<P: AsRef<Path>>(jwt_secret: &[u8], path: P) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedFile = serde_json::from_str(&raw)?;

        let backend = Self::new(jwt_secret);
        backend.seed(tables::CLUBS, seed.clubs);
        backend.seed(tables::CHALLENGES, seed.challenges);

        tracing::info!(
            path = %path.as_ref().display(),
            clubs = backend.row_count(tables::CLUBS),
            challenges = backend.row_count(tables::CHALLENGES),
            "Seeded in-memory backend"
        );
        Ok(backend)
    }

    /// Append rows to a table, bypassing access rules (server-side load).
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Copy of a table's rows, bypassing access rules.
    pub fn dump(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Resolve the caller of a data operation.
    fn caller(&self, access_token: &str) -> Result<String> {
        self.live_claims(access_token).ok_or(AppError::InvalidToken)?;
        self.sessions
            .get(access_token)
            .map(|session| session.user_id.clone())
            .ok_or(AppError::InvalidToken)
    }

    /// Claims of a token that verifies and has not been signed out.
    /// Tokens that no longer verify are dropped from the session table.
    fn live_claims(&self, access_token: &str) -> Option<auth::Claims> {
        match auth::verify_access_token(access_token, &self.jwt_secret) {
            Ok(claims) => self
                .sessions
                .contains_key(access_token)
                .then_some(claims),
            Err(_) => {
                self.sessions.remove(access_token);
                None
            }
        }
    }

    /// Forget every session whose token has expired.
    fn prune_sessions(&self) -> Result<()> {
        let now = auth::unix_now()?;
        self.sessions.retain(|_, session| session.expires_at > now);
        Ok(())
    }


    /// Server-side counter maintenance for `club_memberships` writes.
    fn adjust_member_count(&self, club_id: &str, delta: i64) {
        if let Some(mut clubs) = self.tables.get_mut(tables::CLUBS) {
            for club in clubs.iter_mut() {
                if club.get("id").and_then(Value::as_str) == Some(club_id) {
                    let current = club.get("member_count").and_then(Value::as_i64).unwrap_or(0);
                    club["member_count"] = json!((current + delta).max(0));
                }
            }
        }
    }

    /// Aggregate completed attempts into ranking rows.
    fn compute_leaderboard(&self) -> Vec<Value> {
        let points: HashMap<String, u64> = self
            .dump(tables::CHALLENGES)
            .iter()
            .filter_map(|c| {
                Some((
                    c.get("id")?.as_str()?.to_string(),
                    c.get("points")?.as_u64()?,
                ))
            })
            .collect();

        let names: HashMap<String, String> = self
            .dump(tables::PROFILES)
            .iter()
            .filter_map(|p| {
                Some((
                    p.get("id")?.as_str()?.to_string(),
                    p.get("display_name")?.as_str()?.to_string(),
                ))
            })
            .collect();

        let mut totals: HashMap<String, (u64, u32)> = HashMap::new();
        for attempt in self.dump(tables::USER_CHALLENGES) {
            if attempt.get("status").and_then(Value::as_str) != Some("completed") {
                continue;
            }
            let (Some(user_id), Some(challenge_id)) = (
                attempt.get("user_id").and_then(Value::as_str),
                attempt.get("challenge_id").and_then(Value::as_str),
            ) else {
                continue;
            };
            let entry = totals.entry(user_id.to_string()).or_default();
            entry.0 += points.get(challenge_id).copied().unwrap_or(0);
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(user_id, (total_points, completed))| {
                json!({
                    "display_name": names.get(&user_id).cloned().unwrap_or_default(),
                    "user_id": user_id,
                    "total_points": total_points,
                    "challenges_completed": completed,
                })
            })
            .collect()
    }

    fn issue_session(&self, user: &User) -> Result<Session> {
        let (access_token, expires_at) = auth::create_access_token(user, &self.jwt_secret)?;
        self.prune_sessions()?;
        self.sessions.insert(
            access_token.clone(),
            LiveSession {
                user_id: user.id.clone(),
                expires_at,
            },
        );
        Ok(Session {
            access_token,
            refresh_token: Some(auth::random_token()?),
            expires_at: Some(expires_at as i64),
            user: user.clone(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn unique_violation(table: &str, columns: &[&str]) -> AppError {
    AppError::from_backend(
        Some(AppError::UNIQUE_VIOLATION),
        format!(
            "duplicate key value violates unique constraint \"{}_{}_key\"",
            table,
            columns.join("_")
        ),
    )
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(
        &self,
        table: &str,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>> {
        let rules = rules(table).ok_or_else(|| unknown_table(table))?;

        let caller = match access_token {
            Some(token) => Some(self.caller(token)?),
            None => None,
        };

        let source = if table == tables::LEADERBOARD {
            self.compute_leaderboard()
        } else {
            self.dump(table)
        };

        let mut rows: Vec<Value> = source
            .into_iter()
            .filter(|row| query.matches(row))
            .filter(|row| match (rules.private_rows, rules.owner) {
                (true, Some(owner)) => {
                    caller.is_some() && row.get(owner).and_then(Value::as_str) == caller.as_deref()
                }
                _ => true,
            })
            .collect();

        query.apply_order_and_limit(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Value, access_token: &str) -> Result<Value> {
        let rules = rules(table).ok_or_else(|| unknown_table(table))?;
        if !rules.client_writable {
            return Err(read_only(table));
        }
        let caller = self.caller(access_token)?;

        let Value::Object(mut row) = record else {
            return Err(AppError::BadRequest(format!("{} row must be an object", table)));
        };

        if let Some(owner) = rules.owner {
            match row.get(owner).and_then(Value::as_str) {
                Some(id) if id == caller => {}
                None => {
                    row.insert(owner.to_string(), json!(caller));
                }
                Some(_) => {
                    return Err(AppError::Backend(format!(
                        "new row violates row-level security policy for table \"{}\"",
                        table
                    )))
                }
            }
        }
        if !row.contains_key("id") {
            row.insert("id".to_string(), json!(auth::random_id()?));
        }
        let row = Value::Object(row);

        {
            let mut rows = self.tables.entry(table.to_string()).or_default();
            for columns in rules.unique {
                let clash = rows.iter().any(|existing| {
                    columns
                        .iter()
                        .all(|col| match (existing.get(*col), row.get(*col)) {
                            (Some(a), Some(b)) => !a.is_null() && a == b,
                            _ => false,
                        })
                });
                if clash {
                    return Err(unique_violation(table, columns));
                }
            }
            rows.push(row.clone());
        }

        if table == tables::CLUB_MEMBERSHIPS {
            if let Some(club_id) = row.get("club_id").and_then(Value::as_str) {
                self.adjust_member_count(club_id, 1);
            }
        }

        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: &str,
    ) -> Result<Value> {
        let rules = rules(table).ok_or_else(|| unknown_table(table))?;
        if !rules.client_writable {
            return Err(read_only(table));
        }
        let caller = self.caller(access_token)?;

        let Value::Object(patch) = patch else {
            return Err(AppError::BadRequest(format!("{} patch must be an object", table)));
        };

        let mut rows = self.tables.entry(table.to_string()).or_default();
        let row = rows
            .iter_mut()
            .find(|row| {
                row.get("id").and_then(Value::as_str) == Some(id)
                    && rules
                        .owner
                        .map(|owner| row.get(owner).and_then(Value::as_str) == Some(caller.as_str()))
                        .unwrap_or(true)
            })
            .ok_or_else(|| AppError::NotFound(format!("{} row {}", table, id)))?;

        let fields: &mut Map<String, Value> = row
            .as_object_mut()
            .ok_or_else(|| AppError::Backend(format!("Corrupt {} row {}", table, id)))?;
        for (key, value) in patch {
            // Identity and ownership columns are immutable.
            if key == "id" || Some(key.as_str()) == rules.owner {
                continue;
            }
            fields.insert(key, value);
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: &str, query: &Query, access_token: &str) -> Result<()> {
        let rules = rules(table).ok_or_else(|| unknown_table(table))?;
        if !rules.client_writable {
            return Err(read_only(table));
        }
        let caller = self.caller(access_token)?;

        let removed: Vec<Value> = {
            let mut rows = self.tables.entry(table.to_string()).or_default();
            let (removed, kept): (Vec<Value>, Vec<Value>) =
                std::mem::take(&mut *rows).into_iter().partition(|row| {
                    query.matches(row)
                        && rules
                            .owner
                            .map(|owner| {
                                row.get(owner).and_then(Value::as_str) == Some(caller.as_str())
                            })
                            .unwrap_or(true)
                });
            *rows = kept;
            removed
        };

        if table == tables::CLUB_MEMBERSHIPS {
            for row in &removed {
                if let Some(club_id) = row.get("club_id").and_then(Value::as_str) {
                    self.adjust_member_count(club_id, -1);
                }
            }
        }

        tracing::debug!(table, removed = removed.len(), "Deleted rows");
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>> {
        let Some(claims) = self.live_claims(access_token) else {
            return Ok(None);
        };

        Ok(Some(Session {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: Some(claims.exp as i64),
            user: claims.user(),
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || AppError::Auth("Invalid login credentials".to_string());

        let user = {
            let stored = self.users.get(&normalize_email(email)).ok_or_else(invalid)?;
            if !auth::verify_password(&self.jwt_secret, &stored.salt, password, &stored.password_hash)? {
                return Err(invalid());
            }
            stored.user.clone()
        };

        self.issue_session(&user)
    }

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Auth("Unable to validate email address: invalid format".to_string()));
        }
        if password.len() < 6 {
            return Err(AppError::Auth("Password should be at least 6 characters.".to_string()));
        }

        let user = User {
            id: auth::random_id()?,
            email: email.clone(),
            display_name: display_name.to_string(),
        };
        let salt = auth::random_token()?;
        let password_hash = auth::hash_password(&self.jwt_secret, &salt, password)?;

        // The profile row is written with the auth user, as the hosted
        // backend's sign-up trigger does; holding the profiles table makes
        // the name check and both inserts one step.
        {
            let mut profiles = self.tables.entry(tables::PROFILES.to_string()).or_default();
            let name_taken = profiles
                .iter()
                .any(|p| p.get("display_name").and_then(Value::as_str) == Some(display_name));
            if name_taken {
                return Err(unique_violation(tables::PROFILES, &["display_name"]));
            }

            match self.users.entry(email) {
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    return Err(AppError::Auth("User already registered".to_string()));
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(StoredUser {
                        user: user.clone(),
                        salt,
                        password_hash,
                    });
                }
            }

            profiles.push(json!({
                "id": user.id,
                "display_name": display_name,
                "created_at": now_rfc3339(),
            }));
        }

        tracing::info!(user_id = %user.id, "Registered user");
        self.issue_session(&user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.sessions.remove(access_token);
        Ok(())
    }
}
