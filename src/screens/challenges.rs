// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Challenges screen: accept, submit proof, leaderboard.
//!
//! Per challenge the user moves strictly forward:
//! unaccepted -> in_progress (accept) -> completed (submit proof).
//! The displayed total is folded locally from completed attempts; the
//! leaderboard is the backend's aggregate and is refetched after every
//! completion.

use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::backend::{fetch_rows, insert_row, tables, update_row, Backend, Order, Query};
use crate::error::{AppError, Result};
use crate::models::{
    Challenge, ChallengeCategory, ChallengeStatus, Difficulty, LeaderboardEntry, UserChallenge,
};
use crate::presentation::{category_icon, difficulty_color};
use crate::session::SessionContext;
use crate::time_utils::now_rfc3339;

/// Recorded when a completion is submitted without a proof reference.
pub const PROOF_CONFIRMED: &str = "confirmed";

/// Rows shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

pub const ACCEPT_LABEL: &str = "Accept Challenge";
pub const SUBMIT_PROOF_LABEL: &str = "Submit Proof";
pub const COMPLETED_LABEL: &str = "Completed";

/// Where the user stands on one challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Progress {
    Unaccepted,
    InProgress,
    Completed,
}

impl From<Option<&UserChallenge>> for Progress {
    fn from(attempt: Option<&UserChallenge>) -> Self {
        match attempt.map(|a| a.status) {
            None => Progress::Unaccepted,
            Some(ChallengeStatus::InProgress) => Progress::InProgress,
            Some(ChallengeStatus::Completed) => Progress::Completed,
        }
    }
}

/// Sum of points over challenges whose attempt is completed.
pub fn total_points(challenges: &[Challenge], attempts: &HashMap<String, UserChallenge>) -> u64 {
    challenges
        .iter()
        .filter(|c| Progress::from(attempts.get(&c.id)) == Progress::Completed)
        .map(|c| u64::from(c.points))
        .sum()
}

/// Blank proofs are recorded as [`PROOF_CONFIRMED`].
pub fn normalize_proof(proof: Option<&str>) -> String {
    match proof.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => PROOF_CONFIRMED.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub difficulty_color: String,
    pub category: ChallengeCategory,
    pub category_icon: String,
    pub points: u32,
    pub status: Progress,
    pub action_label: String,
    /// False once completed; the flow never moves backwards
    pub action_enabled: bool,
    pub busy: bool,
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub display_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: u64,
    pub challenges_completed: u32,
    pub is_you: bool,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengesView {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: u64,
    pub challenges: Vec<ChallengeCard>,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Default)]
struct ChallengesState {
    challenges: Vec<Challenge>,
    /// The user's attempts keyed by challenge id
    attempts: HashMap<String, UserChallenge>,
    leaderboard: Vec<LeaderboardEntry>,
    accepting: HashSet<String>,
    submitting: HashSet<String>,
    loaded: bool,
}

impl ChallengesState {
    fn progress(&self, challenge_id: &str) -> Progress {
        self.attempts.get(challenge_id).into()
    }

    fn require_challenge(&self, challenge_id: &str) -> Result<()> {
        if self.challenges.iter().any(|c| c.id == challenge_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Challenge {}", challenge_id)))
        }
    }

    /// Flag an accept as in flight.
    fn begin_accept(&mut self, challenge_id: &str) -> Result<()> {
        self.require_challenge(challenge_id)?;
        if self.accepting.contains(challenge_id) {
            return Err(AppError::BadRequest("Already accepting this challenge".to_string()));
        }
        if self.progress(challenge_id) != Progress::Unaccepted {
            return Err(AppError::BadRequest("Challenge already accepted".to_string()));
        }
        self.accepting.insert(challenge_id.to_string());
        Ok(())
    }

    /// Flag a proof submission as in flight; returns the attempt row id.
    fn begin_submit(&mut self, challenge_id: &str) -> Result<String> {
        self.require_challenge(challenge_id)?;
        if self.submitting.contains(challenge_id) {
            return Err(AppError::BadRequest("Proof submission already in progress".to_string()));
        }
        let attempt_id = match self.attempts.get(challenge_id) {
            Some(a) if a.status == ChallengeStatus::InProgress => a.id.clone().ok_or_else(|| {
                AppError::Backend(format!("Attempt for {} has no id", challenge_id))
            })?,
            Some(_) => {
                return Err(AppError::BadRequest("Challenge already completed".to_string()))
            }
            None => return Err(AppError::BadRequest("Accept the challenge first".to_string())),
        };
        self.submitting.insert(challenge_id.to_string());
        Ok(attempt_id)
    }

    fn total_points(&self) -> u64 {
        total_points(&self.challenges, &self.attempts)
    }
}

/// One user's challenges screen.
///
/// Like the clubs screen, the lock is held only while state changes, so
/// the view shows `busy` for an accept or submission still in flight.
pub struct ChallengesScreen {
    backend: Arc<dyn Backend>,
    ctx: SessionContext,
    state: Mutex<ChallengesState>,
}

impl ChallengesScreen {
    pub fn new(backend: Arc<dyn Backend>, ctx: SessionContext) -> Self {
        Self {
            backend,
            ctx,
            state: Mutex::new(ChallengesState::default()),
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    pub async fn challenges(&self) -> Vec<Challenge> {
        self.state.lock().await.challenges.clone()
    }

    pub async fn attempt(&self, challenge_id: &str) -> Option<UserChallenge> {
        self.state.lock().await.attempts.get(challenge_id).cloned()
    }

    pub async fn progress(&self, challenge_id: &str) -> Progress {
        self.state.lock().await.progress(challenge_id)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.state.lock().await.leaderboard.clone()
    }

    pub async fn total_points(&self) -> u64 {
        self.state.lock().await.total_points()
    }

    pub async fn is_busy(&self, challenge_id: &str) -> bool {
        let state = self.state.lock().await;
        state.accepting.contains(challenge_id) || state.submitting.contains(challenge_id)
    }

    /// Challenges (newest first), own attempts and leaderboard.
    pub async fn load(&self) -> Result<()> {
        let challenges: Vec<Challenge> = fetch_rows(
            &*self.backend,
            tables::CHALLENGES,
            &Query::new().order("created_at", Order::Desc),
            Some(self.ctx.access_token.as_str()),
        )
        .await?;
        let attempts = self.fetch_attempts().await?;
        let leaderboard = self.fetch_leaderboard().await?;

        tracing::debug!(
            user_id = %self.ctx.user.id,
            challenges = challenges.len(),
            attempts = attempts.len(),
            "Loaded challenges"
        );

        let mut state = self.state.lock().await;
        state.challenges = challenges;
        state.attempts = attempts;
        state.leaderboard = leaderboard;
        state.loaded = true;
        Ok(())
    }

    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded().await {
            return Ok(());
        }
        self.load().await
    }

    async fn fetch_attempts(&self) -> Result<HashMap<String, UserChallenge>> {
        let attempts: Vec<UserChallenge> = fetch_rows(
            &*self.backend,
            tables::USER_CHALLENGES,
            &Query::new().eq("user_id", self.ctx.user.id.as_str()),
            Some(self.ctx.access_token.as_str()),
        )
        .await?;
        Ok(attempts
            .into_iter()
            .map(|a| (a.challenge_id.clone(), a))
            .collect())
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        fetch_rows(
            &*self.backend,
            tables::LEADERBOARD,
            &Query::new()
                .order("total_points", Order::Desc)
                .order("display_name", Order::Asc)
                .limit(LEADERBOARD_SIZE),
            Some(self.ctx.access_token.as_str()),
        )
        .await
    }

    async fn refresh_attempts(&self) -> Result<()> {
        let attempts = self.fetch_attempts().await?;
        self.state.lock().await.attempts = attempts;
        Ok(())
    }

    pub async fn refresh_leaderboard(&self) -> Result<()> {
        let leaderboard = self.fetch_leaderboard().await?;
        self.state.lock().await.leaderboard = leaderboard;
        Ok(())
    }

    /// unaccepted -> in_progress
    pub async fn accept(&self, challenge_id: &str) -> Result<()> {
        self.state.lock().await.begin_accept(challenge_id)?;

        let attempt = UserChallenge::accepted(&self.ctx.user.id, challenge_id);
        let result = insert_row(
            &*self.backend,
            tables::USER_CHALLENGES,
            &attempt,
            &self.ctx.access_token,
        )
        .await;

        {
            let mut state = self.state.lock().await;
            state.accepting.remove(challenge_id);
            if let Ok(stored) = &result {
                state.attempts.insert(challenge_id.to_string(), stored.clone());
            }
        }

        if let Err(e) = result {
            tracing::warn!(user_id = %self.ctx.user.id, challenge_id, error = %e, "Accept failed");
            // The attempt may exist already (another tab); pick it up
            if let Err(refresh_err) = self.refresh_attempts().await {
                tracing::error!(error = %refresh_err, "Failed to refetch attempts after refused accept");
            }
            return Err(e);
        }
        tracing::info!(user_id = %self.ctx.user.id, challenge_id, "Accepted challenge");

        if let Err(e) = self.refresh_attempts().await {
            tracing::warn!(error = %e, "Failed to refetch attempts after accept");
        }
        Ok(())
    }

    /// in_progress -> completed
    pub async fn submit_proof(&self, challenge_id: &str, proof: Option<&str>) -> Result<()> {
        let attempt_id = self.state.lock().await.begin_submit(challenge_id)?;

        let patch = json!({
            "status": ChallengeStatus::Completed,
            "proof_url": normalize_proof(proof),
            "completed_at": now_rfc3339(),
        });
        let result: Result<UserChallenge> = update_row(
            &*self.backend,
            tables::USER_CHALLENGES,
            &attempt_id,
            patch,
            &self.ctx.access_token,
        )
        .await;

        let total_points = {
            let mut state = self.state.lock().await;
            state.submitting.remove(challenge_id);
            let stored = result.inspect_err(|e| {
                tracing::warn!(user_id = %self.ctx.user.id, challenge_id, error = %e, "Proof submission failed");
            })?;
            state.attempts.insert(challenge_id.to_string(), stored);
            state.total_points()
        };
        tracing::info!(
            user_id = %self.ctx.user.id,
            challenge_id,
            total_points,
            "Completed challenge"
        );

        if let Err(e) = self.refresh_leaderboard().await {
            tracing::warn!(error = %e, "Failed to refetch leaderboard after completion");
        }
        Ok(())
    }

    pub async fn view(&self) -> ChallengesView {
        let state = self.state.lock().await;
        let challenges = state
            .challenges
            .iter()
            .map(|c| {
                let status = state.progress(&c.id);
                let (action_label, busy) = match status {
                    Progress::Unaccepted => (ACCEPT_LABEL, state.accepting.contains(&c.id)),
                    Progress::InProgress => (SUBMIT_PROOF_LABEL, state.submitting.contains(&c.id)),
                    Progress::Completed => (COMPLETED_LABEL, false),
                };
                ChallengeCard {
                    id: c.id.clone(),
                    title: c.title.clone(),
                    description: c.description.clone(),
                    difficulty: c.difficulty,
                    difficulty_color: difficulty_color(c.difficulty).to_string(),
                    category: c.category,
                    category_icon: category_icon(c.category).to_string(),
                    points: c.points,
                    status,
                    action_label: action_label.to_string(),
                    action_enabled: status != Progress::Completed && !busy,
                    busy,
                    proof_url: state.attempts.get(&c.id).and_then(|a| a.proof_url.clone()),
                }
            })
            .collect();

        let leaderboard = state
            .leaderboard
            .iter()
            .enumerate()
            .map(|(i, entry)| LeaderboardRow {
                rank: i as u32 + 1,
                display_name: entry.display_name.clone(),
                total_points: entry.total_points,
                challenges_completed: entry.challenges_completed,
                is_you: entry.user_id == self.ctx.user.id,
            })
            .collect();

        ChallengesView {
            total_points: state.total_points(),
            challenges,
            leaderboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(id: &str, points: u32) -> Challenge {
        Challenge {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            difficulty: Difficulty::Easy,
            points,
            category: ChallengeCategory::Fitness,
            created_at: None,
        }
    }

    fn attempt(challenge_id: &str, status: ChallengeStatus) -> UserChallenge {
        UserChallenge {
            status,
            ..UserChallenge::accepted("u1", challenge_id)
        }
    }

    #[test]
    fn test_total_counts_only_completed() {
        let challenges = vec![challenge("a", 10), challenge("b", 25), challenge("c", 5)];
        let attempts: HashMap<String, UserChallenge> = [
            ("a".to_string(), attempt("a", ChallengeStatus::Completed)),
            ("b".to_string(), attempt("b", ChallengeStatus::InProgress)),
            ("c".to_string(), attempt("c", ChallengeStatus::Completed)),
        ]
        .into_iter()
        .collect();

        assert_eq!(total_points(&challenges, &attempts), 15);
        assert_eq!(total_points(&challenges, &HashMap::new()), 0);
    }

    #[test]
    fn test_blank_proof_becomes_sentinel() {
        assert_eq!(normalize_proof(None), PROOF_CONFIRMED);
        assert_eq!(normalize_proof(Some("   ")), PROOF_CONFIRMED);
        assert_eq!(
            normalize_proof(Some(" https://img.example/p.png ")),
            "https://img.example/p.png"
        );
    }

    #[test]
    fn test_progress_from_attempt() {
        assert_eq!(Progress::from(None), Progress::Unaccepted);
        let a = attempt("a", ChallengeStatus::InProgress);
        assert_eq!(Progress::from(Some(&a)), Progress::InProgress);
    }

    #[test]
    fn test_second_accept_rejected_while_in_flight() {
        let mut state = ChallengesState {
            challenges: vec![challenge("a", 10)],
            ..Default::default()
        };

        state.begin_accept("a").unwrap();
        let err = state.begin_accept("a").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Already accepting this challenge"));
    }

    #[test]
    fn test_submit_requires_in_progress_attempt() {
        let mut state = ChallengesState {
            challenges: vec![challenge("a", 10)],
            ..Default::default()
        };
        assert!(state.begin_submit("a").is_err());

        let mut stored = attempt("a", ChallengeStatus::InProgress);
        stored.id = Some("row-1".to_string());
        state.attempts.insert("a".to_string(), stored);

        assert_eq!(state.begin_submit("a").unwrap(), "row-1");
        let err = state.begin_submit("a").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("already in progress")));
    }
}
