// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Auth screen: login/sign-up form texts.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthView {
    pub title: String,
    pub subtitle: String,
    pub mode: AuthMode,
    /// Form fields in display order
    pub fields: Vec<String>,
    pub submit_label: String,
    pub submit_path: String,
    pub toggle_label: String,
    pub toggle_mode: AuthMode,
}

pub fn view(mode: AuthMode) -> AuthView {
    let (subtitle, submit_label, submit_path, toggle_label) = match mode {
        AuthMode::Login => (
            "Welcome back!",
            "Log In",
            "/auth/login",
            "Don't have an account? Sign up",
        ),
        AuthMode::Signup => (
            "Join the community",
            "Sign Up",
            "/auth/signup",
            "Already have an account? Log in",
        ),
    };

    let mut fields = Vec::new();
    if mode == AuthMode::Signup {
        fields.push("display_name".to_string());
    }
    fields.push("email".to_string());
    fields.push("password".to_string());

    AuthView {
        title: "TeenConnect".to_string(),
        subtitle: subtitle.to_string(),
        mode,
        fields,
        submit_label: submit_label.to_string(),
        submit_path: submit_path.to_string(),
        toggle_label: toggle_label.to_string(),
        toggle_mode: mode.toggled(),
    }
}
