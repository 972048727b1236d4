// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, session renewal, security, etc.).

pub mod auth;
pub mod cookies;
pub mod federation;
pub mod refresh;
pub mod security;

pub use auth::{require_auth, AuthUser};
pub use federation::require_federation_secret;
pub use refresh::sliding_refresh;
