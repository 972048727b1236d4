// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and security-settings operations for an authenticated user.

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{Profile, ProfilePatch, SecurityFlag, SecuritySetting};
use crate::services::storage::{AvatarStorage, AvatarUpload};
use chrono::NaiveDate;
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn AvatarStorage>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, storage: Arc<dyn AvatarStorage>) -> Self {
        Self { users, storage }
    }

    /// Read the profile, creating a blank one the first time.
    pub async fn profile(&self, user_id: i64) -> Result<Profile> {
        if let Some(profile) = self.users.get_profile(user_id).await? {
            return Ok(profile);
        }

        self.require_user(user_id).await?;
        tracing::debug!(user_id, "Creating missing profile");
        self.users.create_blank_profile(user_id).await?;
        self.users
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {} not found", user_id)))
    }

    /// Merge a partial update into the stored profile.
    pub async fn save_profile(&self, user_id: i64, patch: ProfilePatch) -> Result<Profile> {
        patch.validate()?;
        if let Some(birthday) = patch.birthday.as_deref().filter(|b| !b.is_empty()) {
            NaiveDate::parse_from_str(birthday, "%Y-%m-%d").map_err(|_| {
                AppError::ValidationFailed("birthday must be YYYY-MM-DD".to_string())
            })?;
        }

        let mut profile = self.profile(user_id).await?;
        profile.merge(patch);
        self.users.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn update_avatar(&self, user_id: i64, avatar_url: &str) -> Result<()> {
        if avatar_url.trim().is_empty() {
            return Err(AppError::ValidationFailed("avatar url is empty".to_string()));
        }
        let mut profile = self.profile(user_id).await?;
        profile.avatar = avatar_url.trim().to_string();
        self.users.save_profile(&profile).await
    }

    /// Presigned upload target for the user's avatar.
    pub async fn avatar_presign(&self, user_id: i64) -> Result<AvatarUpload> {
        let user = self.require_user(user_id).await?;
        self.storage.presign_avatar_put(user.id, &user.email).await
    }

    pub async fn security(&self, user_id: i64) -> Result<Vec<SecuritySetting>> {
        let user = self.require_user(user_id).await?;
        Ok(SecuritySetting::list(&user.security))
    }

    /// Set one security flag by its client-facing key.
    pub async fn toggle_security(&self, user_id: i64, key: &str, enabled: bool) -> Result<()> {
        let flag: SecurityFlag = key.parse().map_err(AppError::ValidationFailed)?;
        self.users.set_security_flag(user_id, flag, enabled).await?;
        tracing::info!(user_id, flag = flag.key(), enabled, "Security setting changed");
        Ok(())
    }

    async fn require_user(&self, user_id: i64) -> Result<crate::models::User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}
