// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Presentation hints for challenge cards.
//!
//! Both lookups keep a default entry for values the client does not know,
//! so a new difficulty or category added server-side still renders.

use crate::models::{ChallengeCategory, Difficulty};

/// Neutral grey used for unrecognized difficulties.
pub const DEFAULT_DIFFICULTY_COLOR: &str = "#6b7280";

/// Generic icon used for unrecognized categories.
pub const DEFAULT_CATEGORY_ICON: &str = "star";

const DIFFICULTY_COLORS: &[(Difficulty, &str)] = &[
    (Difficulty::Easy, "#10b981"),
    (Difficulty::Medium, "#f59e0b"),
    (Difficulty::Hard, "#ef4444"),
];

const CATEGORY_ICONS: &[(ChallengeCategory, &str)] = &[
    (ChallengeCategory::Fitness, "barbell"),
    (ChallengeCategory::Creative, "color-palette"),
    (ChallengeCategory::Social, "people"),
    (ChallengeCategory::Learning, "book"),
    (ChallengeCategory::Other, "ellipsis-horizontal"),
];

pub fn difficulty_color(difficulty: Difficulty) -> &'static str {
    DIFFICULTY_COLORS
        .iter()
        .find(|(d, _)| *d == difficulty)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_DIFFICULTY_COLOR)
}

pub fn category_icon(category: ChallengeCategory) -> &'static str {
    CATEGORY_ICONS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_CATEGORY_ICON)
}
