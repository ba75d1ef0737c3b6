// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Auth session holder and the navigation gate.
//!
//! A [`SessionHolder`] wraps the backend auth subsystem for one browser
//! session. Screens never look up identity themselves; they receive a
//! [`SessionContext`] from the gate.

use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

use crate::backend::{fetch_rows, insert_row, tables, Backend, Query};
use crate::error::{AppError, Result};
use crate::models::{Profile, Session, User};

/// Observable auth state. `loading` stays set until the first resolution.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Identity handed to screens for the duration of a request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: User,
    pub access_token: String,
}

impl From<&Session> for SessionContext {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session.access_token.clone(),
        }
    }
}

/// Single routing decision point.
#[derive(Debug, Clone)]
pub enum Gate {
    Loading,
    SignIn,
    Render(SessionContext),
}

/// Decide what the router shows for the current auth state.
pub fn gate(state: &SessionState) -> Gate {
    if state.loading {
        return Gate::Loading;
    }
    match &state.session {
        Some(session) => Gate::Render(session.into()),
        None => Gate::SignIn,
    }
}

/// Sign-in form input.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SignInForm {
    #[validate(length(min = 1, message = "Please enter your email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter your password"))]
    pub password: String,
}

/// Sign-up form input.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "not_blank"))]
    pub display_name: String,
}

fn not_blank(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("Please enter a display name".into());
        return Err(err);
    }
    Ok(())
}

/// First human-readable message out of a validation failure.
fn validation_message(errors: validator::ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string());
    AppError::Validation(message)
}

/// Wraps the backend auth subsystem; notifies subscribers on every change.
pub struct SessionHolder {
    backend: Arc<dyn Backend>,
    state: watch::Sender<SessionState>,
}

impl SessionHolder {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(SessionState {
            session: None,
            loading: true,
        });
        Self { backend, state }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set(&self, session: Option<Session>) {
        self.state.send_replace(SessionState {
            session,
            loading: false,
        });
    }

    /// Resolve the current session from a stored access token, if any.
    pub async fn restore(&self, access_token: Option<&str>) -> Result<Option<User>> {
        let session = match access_token {
            Some(token) => match self.backend.get_session(token).await {
                Ok(session) => session,
                Err(e) => {
                    self.set(None);
                    return Err(e);
                }
            },
            None => None,
        };
        let user = session.as_ref().map(|s| s.user.clone());
        self.set(session);
        Ok(user)
    }

    pub async fn sign_in(&self, form: &SignInForm) -> Result<Session> {
        form.validate().map_err(validation_message)?;

        let session = self
            .backend
            .sign_in(form.email.trim(), &form.password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Sign-in failed"))?;

        // Accounts confirmed by email after sign-up reach here without a
        // profile row on backends that do not create it themselves.
        if let Err(e) = self.ensure_profile(&session).await {
            tracing::warn!(user_id = %session.user.id, error = %e, "Could not create missing profile");
        }

        tracing::info!(user_id = %session.user.id, "Signed in");
        self.set(Some(session.clone()));
        Ok(session)
    }

    /// Insert the caller's profile row unless it already exists.
    async fn ensure_profile(&self, session: &Session) -> Result<()> {
        let existing: Vec<Profile> = fetch_rows(
            &*self.backend,
            tables::PROFILES,
            &Query::new().eq("id", session.user.id.as_str()).limit(1),
            Some(session.access_token.as_str()),
        )
        .await?;
        if !existing.is_empty() {
            return Ok(());
        }

        let display_name = session.user.display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::Validation("Please enter a display name".to_string()));
        }
        let profile = Profile {
            id: session.user.id.clone(),
            display_name: display_name.to_string(),
            created_at: None,
        };
        insert_row(&*self.backend, tables::PROFILES, &profile, &session.access_token).await?;
        tracing::info!(user_id = %session.user.id, "Created missing profile");
        Ok(())
    }

    /// Create the auth user and its unique profile row.
    ///
    /// The backend writes the profile together with the auth user, so a
    /// refused display name never leaves an account behind.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Session> {
        form.validate().map_err(validation_message)?;
        let display_name = form.display_name.trim();

        let taken: Vec<Profile> = fetch_rows(
            &*self.backend,
            tables::PROFILES,
            &Query::new().eq("display_name", display_name).limit(1),
            None,
        )
        .await?;
        if !taken.is_empty() {
            return Err(AppError::Conflict(AppError::DISPLAY_NAME_TAKEN.to_string()));
        }

        let name_taken = |e: AppError| match e {
            AppError::Conflict(_) => AppError::Conflict(AppError::DISPLAY_NAME_TAKEN.to_string()),
            other => other,
        };

        let session = self
            .backend
            .sign_up(form.email.trim(), &form.password, display_name)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Sign-up failed"))
            .map_err(name_taken)?;

        self.ensure_profile(&session).await.map_err(name_taken)?;

        tracing::info!(user_id = %session.user.id, "Signed up");
        self.set(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<()> {
        let token = self
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.access_token.clone());

        if let Some(token) = token {
            self.backend.sign_out(&token).await?;
        }
        self.set(None);
        Ok(())
    }
}
