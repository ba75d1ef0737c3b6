// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Data models for the application.

pub mod challenge;
pub mod club;
pub mod user;

pub use challenge::{
    Challenge, ChallengeCategory, ChallengeStatus, Difficulty, LeaderboardEntry, UserChallenge,
};
pub use club::{Club, ClubMembership};
pub use user::{Profile, Session, User};
