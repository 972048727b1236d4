// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account model shared by the repository and the session service.

use chrono::{DateTime, Utc};

/// Account record as stored by the user repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned id, immutable after creation
    pub id: i64,
    /// Unique, compared case-sensitively as stored
    pub email: String,
    pub nickname: Option<String>,
    /// `salt || derived-key`; `None` for accounts created by federation
    pub password_hash: Option<Vec<u8>>,
    /// Federation provider name (e.g. `yandex`)
    pub provider: Option<String>,
    /// Provider-issued subject id
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub security: SecurityFlags,
}

/// Per-account security toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityFlags {
    pub two_fa_enabled: bool,
    pub login_alerts: bool,
    pub allow_new_devices: bool,
}

/// Fields supplied when creating an account; the store assigns the rest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nickname: Option<String>,
    pub password_hash: Option<Vec<u8>>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

impl NewUser {
    /// Password account created through signup.
    pub fn with_password(email: &str, nickname: &str, password_hash: Vec<u8>) -> Self {
        Self {
            email: email.to_string(),
            nickname: Some(nickname.to_string()),
            password_hash: Some(password_hash),
            provider: None,
            provider_id: None,
        }
    }

    /// Account bound to a federation identity, without a password.
    pub fn federated(provider: &str, provider_id: &str, email: &str) -> Self {
        Self {
            email: email.to_string(),
            nickname: None,
            password_hash: None,
            provider: Some(provider.to_string()),
            provider_id: Some(provider_id.to_string()),
        }
    }
}
