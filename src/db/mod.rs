// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account persistence.
//!
//! The session service only sees [`UserRepository`]; production wires in
//! [`PgUserRepository`], tests use [`MemoryUserRepository`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;

use crate::error::AppError;
use crate::models::{NewUser, Profile, SecurityFlag, User};
use async_trait::async_trait;

/// Narrow capability interface over the account store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AppError>;

    /// Insert a new account. Fails with `AlreadyExists` on a duplicate email.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn update_password(&self, id: i64, password_hash: Vec<u8>) -> Result<(), AppError>;

    async fn set_security_flag(
        &self,
        id: i64,
        flag: SecurityFlag,
        enabled: bool,
    ) -> Result<(), AppError>;

    /// Create an empty profile row; does nothing if one already exists.
    async fn create_blank_profile(&self, user_id: i64) -> Result<(), AppError>;

    /// Profile joined with the account. `None` when no profile row exists.
    async fn get_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError>;

    /// Upsert every editable profile field.
    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError>;
}
