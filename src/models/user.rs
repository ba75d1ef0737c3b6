// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! User, profile and session models.

use serde::{Deserialize, Serialize};

/// Authenticated identity as reported by the backend auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-issued user id (also the `profiles` row id)
    pub id: String,
    pub email: String,
    pub display_name: String,
}

/// A live backend session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent on every row-level request
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as a Unix timestamp, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// Public profile row (`profiles` table). Display names are unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
