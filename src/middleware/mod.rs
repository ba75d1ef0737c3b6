// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Middleware modules (session gate, security headers).

pub mod security;
pub mod session;

pub use session::require_session;
