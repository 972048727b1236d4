// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth service: accounts, dual-token sessions and profile settings.
//!
//! This crate provides the HTTP API for signing up, signing in (password
//! or federated identity), rotating and revoking sessions, and managing
//! a small per-user profile and security-settings store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{ProfileService, SessionService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionService,
    pub profiles: ProfileService,
}
