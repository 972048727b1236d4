// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod profile;
pub mod security;
pub mod user;

pub use profile::{Profile, ProfilePatch};
pub use security::{SecurityFlag, SecuritySetting};
pub use user::{NewUser, SecurityFlags, User};
