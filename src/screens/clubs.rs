// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Clubs screen: discovery, category filter and membership toggling.
//!
//! Join and leave are optimistic. The local membership set and counter
//! change before the backend answers; if the backend refuses, the whole
//! list and membership set are reloaded rather than rolling back the one
//! club. While a change is pending the club is flagged busy and further
//! changes to it are rejected.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::backend::{fetch_rows, insert_row, tables, Backend, Order, Query};
use crate::error::{AppError, Result};
use crate::models::{Club, ClubMembership};
use crate::session::SessionContext;

/// Category sentinel that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

pub const JOIN_LABEL: &str = "Join";
pub const LEAVE_LABEL: &str = "Leave";

/// Clubs matching a category; [`ALL_CATEGORIES`] matches everything.
pub fn filter_by_category<'a>(clubs: &'a [Club], category: &str) -> Vec<&'a Club> {
    clubs
        .iter()
        .filter(|club| category == ALL_CATEGORIES || club.category == category)
        .collect()
}

/// The sentinel followed by each distinct category in first-seen order.
pub fn categories(clubs: &[Club]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(
            clubs
                .iter()
                .filter(|club| seen.insert(club.category.as_str()))
                .map(|club| club.category.clone()),
        )
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClubCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub member_count: u32,
    pub is_member: bool,
    pub action_label: String,
    /// A join/leave request for this club has not come back yet
    pub busy: bool,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClubsView {
    pub selected_category: String,
    pub categories: Vec<String>,
    pub clubs: Vec<ClubCard>,
}

/// Requested membership change; `None` at the call site means toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Join,
    Leave,
}

#[derive(Default)]
struct ClubsState {
    clubs: Vec<Club>,
    memberships: HashSet<String>,
    in_flight: HashSet<String>,
    loaded: bool,
}

impl ClubsState {
    fn club_mut(&mut self, club_id: &str) -> Result<&mut Club> {
        self.clubs
            .iter_mut()
            .find(|c| c.id == club_id)
            .ok_or_else(|| AppError::NotFound(format!("Club {}", club_id)))
    }

    /// Flag the club as in flight and apply the optimistic change.
    fn begin(&mut self, club_id: &str, requested: Option<Change>) -> Result<Change> {
        self.club_mut(club_id)?;
        if self.in_flight.contains(club_id) {
            return Err(AppError::BadRequest(
                "A membership change for this club is already in progress".to_string(),
            ));
        }

        let is_member = self.memberships.contains(club_id);
        let change = match (requested, is_member) {
            (Some(Change::Join), true) => {
                return Err(AppError::BadRequest("Already a member of this club".to_string()))
            }
            (Some(Change::Leave), false) => {
                return Err(AppError::BadRequest("Not a member of this club".to_string()))
            }
            (Some(change), _) => change,
            (None, true) => Change::Leave,
            (None, false) => Change::Join,
        };

        self.in_flight.insert(club_id.to_string());
        let club = self.club_mut(club_id)?;
        match change {
            Change::Join => {
                club.member_count += 1;
                self.memberships.insert(club_id.to_string());
            }
            Change::Leave => {
                club.member_count = club.member_count.saturating_sub(1);
                self.memberships.remove(club_id);
            }
        }
        Ok(change)
    }

    /// Take a fresh backend snapshot. Clubs still in flight keep their
    /// optimistic membership and counter until the backend answers.
    fn replace(&mut self, mut clubs: Vec<Club>, mut memberships: HashSet<String>) {
        for club_id in &self.in_flight {
            let local = self.clubs.iter().find(|c| &c.id == club_id);
            let fresh = clubs.iter_mut().find(|c| &c.id == club_id);
            if let (Some(local), Some(fresh)) = (local, fresh) {
                fresh.member_count = local.member_count;
            }
            if self.memberships.contains(club_id) {
                memberships.insert(club_id.clone());
            } else {
                memberships.remove(club_id);
            }
        }
        self.clubs = clubs;
        self.memberships = memberships;
        self.loaded = true;
    }
}

/// One user's clubs screen.
///
/// State sits behind a lock that is only held while it changes, never
/// across a backend round trip, so views render while a join or leave is
/// still pending.
pub struct ClubsScreen {
    backend: Arc<dyn Backend>,
    ctx: SessionContext,
    state: Mutex<ClubsState>,
}

impl ClubsScreen {
    pub fn new(backend: Arc<dyn Backend>, ctx: SessionContext) -> Self {
        Self {
            backend,
            ctx,
            state: Mutex::new(ClubsState::default()),
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    pub async fn clubs(&self) -> Vec<Club> {
        self.state.lock().await.clubs.clone()
    }

    pub async fn club(&self, club_id: &str) -> Option<Club> {
        let state = self.state.lock().await;
        state.clubs.iter().find(|c| c.id == club_id).cloned()
    }

    pub async fn is_member(&self, club_id: &str) -> bool {
        self.state.lock().await.memberships.contains(club_id)
    }

    pub async fn is_busy(&self, club_id: &str) -> bool {
        self.state.lock().await.in_flight.contains(club_id)
    }

    /// Replace local state with the backend's clubs and memberships.
    pub async fn load(&self) -> Result<()> {
        let backend = &*self.backend;
        let token = self.ctx.access_token.as_str();

        let clubs: Vec<Club> = fetch_rows(
            backend,
            tables::CLUBS,
            &Query::new().order("name", Order::Asc),
            Some(token),
        )
        .await?;

        let memberships: Vec<ClubMembership> = fetch_rows(
            backend,
            tables::CLUB_MEMBERSHIPS,
            &Query::new().eq("user_id", self.ctx.user.id.as_str()),
            Some(token),
        )
        .await?;

        tracing::debug!(
            user_id = %self.ctx.user.id,
            clubs = clubs.len(),
            memberships = memberships.len(),
            "Loaded clubs"
        );

        self.state
            .lock()
            .await
            .replace(clubs, memberships.into_iter().map(|m| m.club_id).collect());
        Ok(())
    }

    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded().await {
            return Ok(());
        }
        self.load().await
    }

    /// After a refused write, the backend is the only trustworthy state.
    async fn resync(&self, err: AppError) -> AppError {
        tracing::warn!(user_id = %self.ctx.user.id, error = %err, "Membership change failed, reloading clubs");
        if let Err(reload_err) = self.load().await {
            tracing::error!(error = %reload_err, "Failed to reload clubs");
        }
        err
    }

    async fn change(&self, club_id: &str, requested: Option<Change>) -> Result<()> {
        let change = self.state.lock().await.begin(club_id, requested)?;

        let result = match change {
            Change::Join => {
                let membership = ClubMembership {
                    user_id: self.ctx.user.id.clone(),
                    club_id: club_id.to_string(),
                    joined_at: None,
                };
                insert_row(
                    &*self.backend,
                    tables::CLUB_MEMBERSHIPS,
                    &membership,
                    &self.ctx.access_token,
                )
                .await
                .map(|_| ())
            }
            Change::Leave => {
                let key = Query::new()
                    .eq("user_id", self.ctx.user.id.as_str())
                    .eq("club_id", club_id);
                self.backend
                    .delete(tables::CLUB_MEMBERSHIPS, &key, &self.ctx.access_token)
                    .await
            }
        };

        let mut state = self.state.lock().await;
        state.in_flight.remove(club_id);
        match result {
            Ok(()) => {
                // Reapply in case a reload raced the write
                match change {
                    Change::Join => state.memberships.insert(club_id.to_string()),
                    Change::Leave => state.memberships.remove(club_id),
                };
                tracing::info!(user_id = %self.ctx.user.id, club_id, ?change, "Membership changed");
                Ok(())
            }
            Err(e) => {
                drop(state);
                Err(self.resync(e).await)
            }
        }
    }

    /// not-member -> member
    pub async fn join(&self, club_id: &str) -> Result<()> {
        self.change(club_id, Some(Change::Join)).await
    }

    /// member -> not-member
    pub async fn leave(&self, club_id: &str) -> Result<()> {
        self.change(club_id, Some(Change::Leave)).await
    }

    /// Join when not a member, leave otherwise.
    pub async fn toggle(&self, club_id: &str) -> Result<()> {
        self.change(club_id, None).await
    }

    pub async fn view(&self, category: &str) -> ClubsView {
        let state = self.state.lock().await;
        let clubs = filter_by_category(&state.clubs, category)
            .into_iter()
            .map(|club| {
                let is_member = state.memberships.contains(&club.id);
                ClubCard {
                    id: club.id.clone(),
                    name: club.name.clone(),
                    description: club.description.clone(),
                    category: club.category.clone(),
                    image_url: club.image_url.clone(),
                    member_count: club.member_count,
                    is_member,
                    action_label: if is_member { LEAVE_LABEL } else { JOIN_LABEL }.to_string(),
                    busy: state.in_flight.contains(&club.id),
                }
            })
            .collect();

        ClubsView {
            selected_category: category.to_string(),
            categories: categories(&state.clubs),
            clubs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club(id: &str, category: &str) -> Club {
        Club {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            category: category.to_string(),
            image_url: None,
            member_count: 0,
        }
    }

    #[test]
    fn test_filter_all_returns_everything() {
        let clubs = vec![club("a", "sports"), club("b", "arts"), club("c", "sports")];
        assert_eq!(filter_by_category(&clubs, ALL_CATEGORIES).len(), 3);
    }

    #[test]
    fn test_filter_returns_exact_subset() {
        let clubs = vec![club("a", "sports"), club("b", "arts"), club("c", "sports")];
        let ids: Vec<&str> = filter_by_category(&clubs, "sports")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(filter_by_category(&clubs, "music").is_empty());
    }

    #[test]
    fn test_categories_deduplicated_with_sentinel_first() {
        let clubs = vec![club("a", "sports"), club("b", "arts"), club("c", "sports")];
        assert_eq!(categories(&clubs), vec!["all", "sports", "arts"]);
        assert_eq!(categories(&[]), vec!["all"]);
    }

    #[test]
    fn test_second_change_rejected_while_in_flight() {
        let mut state = ClubsState {
            clubs: vec![club("a", "sports")],
            ..Default::default()
        };

        assert_eq!(state.begin("a", None).unwrap(), Change::Join);
        assert_eq!(state.clubs[0].member_count, 1);
        assert!(state.memberships.contains("a"));

        let err = state.begin("a", Some(Change::Leave)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("already in progress")));
    }

    #[test]
    fn test_snapshot_keeps_pending_change() {
        let mut state = ClubsState {
            clubs: vec![club("a", "sports"), club("b", "arts")],
            ..Default::default()
        };
        state.begin("a", Some(Change::Join)).unwrap();

        // Snapshot taken before the insert landed
        state.replace(vec![club("a", "sports"), club("b", "arts")], HashSet::new());

        assert!(state.memberships.contains("a"));
        assert_eq!(state.clubs[0].member_count, 1);
        assert_eq!(state.clubs[1].member_count, 0);
    }
}
