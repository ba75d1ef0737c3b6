// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Club and membership models.

use serde::{Deserialize, Serialize};

/// A club row (`clubs` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Denormalized member counter maintained by the backend
    #[serde(default)]
    pub member_count: u32,
}

/// Existence of this row means the user is a member of the club.
///
/// `(user_id, club_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubMembership {
    pub user_id: String,
    pub club_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
}
