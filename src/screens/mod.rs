// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Screen state machines and their JSON views.
//!
//! Each signed-in user owns one instance of every stateful screen. The
//! instance is a thin mirror of the last backend response plus whatever
//! optimistic changes are in flight.

pub mod auth;
pub mod challenges;
pub mod clubs;
pub mod home;

pub use challenges::{ChallengesScreen, Progress};
pub use clubs::ClubsScreen;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::backend::Backend;
use crate::session::SessionContext;

/// A screen bound to the access token it was mounted with.
struct Slot<S> {
    access_token: String,
    screen: Arc<S>,
}

/// Per-user screen instances, keyed by user id.
///
/// A slot is replaced when the user comes back with a different access
/// token, so a screen never issues requests under a stale identity.
#[derive(Default)]
pub struct ScreenStore {
    clubs: DashMap<String, Slot<ClubsScreen>>,
    challenges: DashMap<String, Slot<ChallengesScreen>>,
}

fn slot_for<S>(
    map: &DashMap<String, Slot<S>>,
    ctx: &SessionContext,
    mount: impl FnOnce() -> S,
) -> Arc<S> {
    match map.entry(ctx.user.id.clone()) {
        Entry::Occupied(slot) if slot.get().access_token == ctx.access_token => {
            slot.get().screen.clone()
        }
        Entry::Occupied(mut slot) => {
            let screen = Arc::new(mount());
            slot.insert(Slot {
                access_token: ctx.access_token.clone(),
                screen: screen.clone(),
            });
            screen
        }
        Entry::Vacant(vacant) => {
            let screen = Arc::new(mount());
            vacant.insert(Slot {
                access_token: ctx.access_token.clone(),
                screen: screen.clone(),
            });
            screen
        }
    }
}

impl ScreenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's clubs screen, mounting a fresh one if needed.
    pub fn clubs(&self, backend: &Arc<dyn Backend>, ctx: &SessionContext) -> Arc<ClubsScreen> {
        slot_for(&self.clubs, ctx, || ClubsScreen::new(backend.clone(), ctx.clone()))
    }

    /// The user's challenges screen, mounting a fresh one if needed.
    pub fn challenges(
        &self,
        backend: &Arc<dyn Backend>,
        ctx: &SessionContext,
    ) -> Arc<ChallengesScreen> {
        slot_for(&self.challenges, ctx, || {
            ChallengesScreen::new(backend.clone(), ctx.clone())
        })
    }

    /// Drop every screen owned by a user (sign-out).
    pub fn forget(&self, user_id: &str) {
        self.clubs.remove(user_id);
        self.challenges.remove(user_id);
    }
}
