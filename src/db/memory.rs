// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`UserRepository`] for tests and local experiments.
//!
//! Mirrors the Postgres semantics that matter to the service: ids start at
//! 1, email is unique, profiles fall back to the nickname for `full_name`.

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{NewUser, Profile, SecurityFlag, SecurityFlags, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, User>,
    profiles: HashMap<i64, Profile>,
}

/// Mutex-guarded maps standing in for the `users`/`profiles` tables.
#[derive(Default)]
pub struct MemoryUserRepository {
    tables: Mutex<Tables>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Database("memory repository poisoned".to_string()))
    }

    /// Number of stored accounts.
    pub fn user_count(&self) -> usize {
        self.tables.lock().map(|t| t.users.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| {
                u.provider.as_deref() == Some(provider)
                    && u.provider_id.as_deref() == Some(provider_id)
            })
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::AlreadyExists);
        }

        tables.next_id += 1;
        let user = User {
            id: tables.next_id,
            email: new_user.email,
            nickname: new_user.nickname,
            password_hash: new_user.password_hash,
            provider: new_user.provider,
            provider_id: new_user.provider_id,
            created_at: chrono::Utc::now(),
            security: SecurityFlags {
                allow_new_devices: true,
                ..SecurityFlags::default()
            },
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: Vec<u8>) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.password_hash = Some(password_hash);
        Ok(())
    }

    async fn set_security_flag(
        &self,
        id: i64,
        flag: SecurityFlag,
        enabled: bool,
    ) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        flag.set(&mut user.security, enabled);
        Ok(())
    }

    async fn create_blank_profile(&self, user_id: i64) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::Database(format!(
                "profile references missing user {}",
                user_id
            )));
        }
        tables.profiles.entry(user_id).or_insert_with(|| Profile {
            user_id,
            ..Profile::default()
        });
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError> {
        let tables = self.lock()?;
        let (Some(user), Some(stored)) = (tables.users.get(&user_id), tables.profiles.get(&user_id))
        else {
            return Ok(None);
        };

        let mut profile = stored.clone();
        profile.email = user.email.clone();
        if profile.full_name.is_empty() {
            profile.full_name = user.nickname.clone().unwrap_or_default();
        }
        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&profile.user_id) {
            return Err(AppError::Database(format!(
                "profile references missing user {}",
                profile.user_id
            )));
        }
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }
}
