// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session lifecycle.
//!
//! A refresh token is usable only while the token manager accepts its
//! signature and expiry *and* the session store holds its liveness
//! record. The two checks stay separate: the store cannot un-sign a
//! token, and the signature says nothing about revocation.
//!
//! Refresh-token states: issued -> active (liveness recorded) -> one of
//! rotated-out, revoked or expired. All three are terminal.

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use crate::services::events::{AuthEvent, EventPublisher};
use crate::services::password::{PasswordHasher, KEY_LEN, SALT_LEN};
use crate::services::session_store::SessionStore;
use crate::services::tokens::{Claims, TokenKind, TokenManager, TokenPair};
use std::sync::Arc;

/// Stand-in hash verified against when the email is unknown, so both
/// failure paths pay for one key derivation.
const DUMMY_HASH: [u8; SALT_LEN + KEY_LEN] = [0u8; SALT_LEN + KEY_LEN];

/// Orchestrates signup, signin, federation login, rotation and revocation.
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    events: Arc<dyn EventPublisher>,
    tokens: TokenManager,
    hasher: PasswordHasher,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn EventPublisher>,
        tokens: TokenManager,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            sessions,
            events,
            tokens,
            hasher,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Create a password account with a blank profile.
    ///
    /// The existence check is advisory; the store's unique constraint is
    /// what actually prevents duplicates.
    pub async fn sign_up(&self, email: &str, nickname: &str, password: &str) -> Result<User> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::AlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;
        let user = self
            .users
            .create(NewUser::with_password(email, nickname, password_hash))
            .await?;

        if let Err(e) = self.users.create_blank_profile(user.id).await {
            // Profile reads create it lazily, so the account is still usable.
            tracing::warn!(user_id = user.id, error = %e, "Failed to create blank profile");
        }

        self.notify(AuthEvent::user_created(user.id, &user.email))
            .await;

        tracing::info!(user_id = user.id, "Account created");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email, federation-only account and wrong password all
    /// return `InvalidCredentials`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair> {
        let user = self.users.find_by_email(email).await?;

        let stored = user
            .as_ref()
            .and_then(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_vec());
        let verified = self.verify_password(password, stored).await?;

        let user = match user {
            Some(user) if verified && user.password_hash.is_some() => user,
            _ => {
                tracing::info!("Sign-in rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let pair = self.open_session(user.id).await?;
        self.notify(AuthEvent::login(user.id)).await;
        Ok(pair)
    }

    /// Sign in through a federation identity, creating the account on first use.
    ///
    /// The identity is trusted as asserted by the upstream provider.
    pub async fn social_login(
        &self,
        provider: &str,
        provider_id: &str,
        email: &str,
    ) -> Result<TokenPair> {
        let user = match self.users.find_by_provider(provider, provider_id).await? {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(NewUser::federated(provider, provider_id, email))
                    .await?;
                if let Err(e) = self.users.create_blank_profile(user.id).await {
                    tracing::warn!(user_id = user.id, error = %e, "Failed to create blank profile");
                }
                tracing::info!(user_id = user.id, provider, "Federated account created");
                self.notify(AuthEvent::user_created(user.id, &user.email))
                    .await;
                user
            }
        };

        let pair = self.open_session(user.id).await?;
        self.notify(AuthEvent::login(user.id)).await;
        Ok(pair)
    }

    /// Rotate a live refresh token into a new pair.
    ///
    /// The new session is recorded before the old one is revoked, so a
    /// failure in between leaves the caller with the old, still valid
    /// session rather than none. Two concurrent rotations of the same
    /// token may both succeed.
    pub async fn refresh(&self, old_refresh: &str) -> Result<TokenPair> {
        if !self.sessions.is_live(old_refresh).await? {
            return Err(AppError::RefreshExpired);
        }

        let claims = self.tokens.parse_kind(old_refresh, TokenKind::Refresh)?;
        let user_id = claims.user_id()?;

        let pair = self.tokens.generate(user_id)?;
        self.sessions
            .record_liveness(&pair.refresh_token, self.tokens.refresh_ttl_seconds())
            .await?;

        if !self.sessions.revoke(old_refresh).await? {
            tracing::warn!(user_id, "Refresh token already rotated by a concurrent request");
        }

        tracing::debug!(user_id, "Session rotated");
        Ok(pair)
    }

    /// Delete a refresh token's liveness record. Idempotent.
    pub async fn revoke_refresh(&self, refresh_token: &str) -> Result<()> {
        self.sessions.revoke(refresh_token).await?;
        Ok(())
    }

    /// Blacklist an access token id for `ttl_seconds`.
    pub async fn revoke_access(&self, jti: &str, ttl_seconds: i64) -> Result<()> {
        self.sessions.blacklist(jti, ttl_seconds).await
    }

    /// True unless the access token id is blacklisted.
    pub async fn access_allowed(&self, jti: &str) -> Result<bool> {
        Ok(!self.sessions.is_blacklisted(jti).await?)
    }

    /// Full access-token check: signature, expiry, kind and blacklist.
    pub async fn authenticate(&self, access_token: &str) -> Result<Claims> {
        let claims = self.tokens.parse_kind(access_token, TokenKind::Access)?;
        if !self.access_allowed(&claims.jti).await? {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// End a session: revoke the refresh token and, when a valid access
    /// token accompanies it, blacklist that for its remaining lifetime.
    pub async fn logout(&self, refresh_token: Option<&str>, access_token: Option<&str>) -> Result<()> {
        if let Some(refresh) = refresh_token.filter(|t| !t.is_empty()) {
            self.revoke_refresh(refresh).await?;
        }

        if let Some(access) = access_token.filter(|t| !t.is_empty()) {
            if let Ok(claims) = self.tokens.parse_kind(access, TokenKind::Access) {
                let remaining = claims.remaining_seconds(chrono::Utc::now().timestamp());
                self.revoke_access(&claims.jti, remaining.max(1)).await?;
            }
        }
        Ok(())
    }

    /// Replace the password after checking the current one.
    ///
    /// Existing sessions are left untouched.
    pub async fn change_password(&self, user_id: i64, old: &str, new: &str) -> Result<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let Some(stored) = user.password_hash else {
            return Err(AppError::InvalidCredentials);
        };
        if !self.verify_password(old, stored).await? {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = self.hash_password(new).await?;
        self.users.update_password(user_id, password_hash).await?;
        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Mint a pair and mark its refresh token live.
    async fn open_session(&self, user_id: i64) -> Result<TokenPair> {
        let pair = self.tokens.generate(user_id)?;
        self.sessions
            .record_liveness(&pair.refresh_token, self.tokens.refresh_ttl_seconds())
            .await?;
        tracing::info!(user_id, "Session opened");
        Ok(pair)
    }

    async fn notify(&self, event: AuthEvent) {
        let user_id = event.key();
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(user_id, error = %e, "Failed to publish auth event");
        }
    }

    async fn hash_password(&self, password: &str) -> Result<Vec<u8>> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))?
            .map_err(AppError::Internal)
    }

    async fn verify_password(&self, password: &str, stored: Vec<u8>) -> Result<bool> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))
    }
}
