// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Home screen: navigation hub and sign-out.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::User;

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NavLink {
    pub label: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HomeView {
    pub title: String,
    pub subtitle: String,
    pub display_name: String,
    pub links: Vec<NavLink>,
    pub sign_out_path: String,
}

pub fn view(user: &User) -> HomeView {
    let link = |label: &str, path: &str| NavLink {
        label: label.to_string(),
        path: path.to_string(),
    };

    HomeView {
        title: "Welcome to TeenConnect!".to_string(),
        subtitle: "Connect with friends, join clubs, and take on challenges".to_string(),
        display_name: user.display_name.clone(),
        links: vec![
            link("Go to Clubs", "/clubs"),
            link("Go to Challenges", "/challenges"),
        ],
        sign_out_path: "/auth/logout".to_string(),
    }
}
