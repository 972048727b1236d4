// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model and partial-update merging.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile as returned to clients.
///
/// Empty strings stand for "not set"; `email` is a read-only copy of the
/// account email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub full_name: String,
    pub about: String,
    pub email: String,
    pub avatar: String,
    pub city: String,
    pub phone: String,
    pub birthday: String,
}

/// Partial profile update. Missing or empty fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfilePatch {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub about: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub avatar: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    #[validate(length(max = 10))]
    pub birthday: Option<String>,
}

impl Profile {
    /// Apply a patch: only non-empty incoming fields overwrite.
    pub fn merge(&mut self, patch: ProfilePatch) {
        fn take(dst: &mut String, src: Option<String>) {
            if let Some(value) = src.filter(|v| !v.is_empty()) {
                *dst = value;
            }
        }

        take(&mut self.full_name, patch.full_name);
        take(&mut self.about, patch.about);
        take(&mut self.avatar, patch.avatar);
        take(&mut self.city, patch.city);
        take(&mut self.phone, patch.phone);
        take(&mut self.birthday, patch.birthday);
    }
}
