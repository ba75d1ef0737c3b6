// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Challenge, per-user attempt and leaderboard models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Challenge difficulty. Values the client does not know deserialize
/// to `Unknown` instead of failing the whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[serde(other)]
    Unknown,
}

/// Challenge category, with the same `Unknown` catch-all as [`Difficulty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ChallengeCategory {
    Fitness,
    Creative,
    Social,
    Learning,
    Other,
    #[serde(other)]
    Unknown,
}

/// A challenge row (`challenges` table). Read-only for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub category: ChallengeCategory,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Stored status of a user's attempt. "Unaccepted" is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    InProgress,
    Completed,
}

/// Per-user attempt record (`user_challenges` table).
///
/// `(user_id, challenge_id)` is unique. Rows are never deleted by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChallenge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub challenge_id: String,
    pub status: ChallengeStatus,
    #[serde(default)]
    pub proof_url: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl UserChallenge {
    /// A freshly accepted attempt.
    pub fn accepted(user_id: &str, challenge_id: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            challenge_id: challenge_id.to_string(),
            status: ChallengeStatus::InProgress,
            proof_url: None,
            completed_at: None,
        }
    }
}

/// Server-computed ranking row (`leaderboard` view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub challenges_completed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_enums_fall_back_to_unknown() {
        let challenge: Challenge = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "title": "Juggle",
            "difficulty": "legendary",
            "points": 10,
            "category": "circus"
        }))
        .unwrap();

        assert_eq!(challenge.difficulty, Difficulty::Unknown);
        assert_eq!(challenge.category, ChallengeCategory::Unknown);
        assert_eq!(challenge.description, "");
    }

    #[test]
    fn test_status_uses_snake_case() {
        let value = serde_json::to_value(ChallengeStatus::InProgress).unwrap();
        assert_eq!(value, "in_progress");
    }
}
