// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh-token liveness and access-token blacklist.
//!
//! Both records carry a TTL mirroring the token they describe, so the
//! store never needs sweeping. Absence of a liveness record means the
//! refresh token is dead, whether it expired, was revoked or was never
//! issued.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const LIVENESS_PREFIX: &str = "rt:";
const BLACKLIST_PREFIX: &str = "blk:";

/// External key/value record consumed by the session service.
///
/// Operations on different keys may run concurrently; same-key races are
/// last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mark a refresh token live for `ttl_seconds`. Idempotent upsert.
    async fn record_liveness(&self, refresh_token: &str, ttl_seconds: i64)
        -> Result<(), AppError>;

    async fn is_live(&self, refresh_token: &str) -> Result<bool, AppError>;

    /// Drop the liveness record. Returns whether one existed; unknown tokens are not an error.
    async fn revoke(&self, refresh_token: &str) -> Result<bool, AppError>;

    async fn blacklist(&self, access_jti: &str, ttl_seconds: i64) -> Result<(), AppError>;

    async fn is_blacklisted(&self, access_jti: &str) -> Result<bool, AppError>;
}

/// Redis-backed store: `rt:<token>` and `blk:<jti>` keys with `SET EX`.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

/// Redis rejects non-positive expirations.
fn expiry(ttl_seconds: i64) -> u64 {
    ttl_seconds.max(1) as u64
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn record_liveness(
        &self,
        refresh_token: &str,
        ttl_seconds: i64,
    ) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                format!("{LIVENESS_PREFIX}{refresh_token}"),
                1,
                expiry(ttl_seconds),
            )
            .await?;
        Ok(())
    }

    async fn is_live(&self, refresh_token: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn
            .exists(format!("{LIVENESS_PREFIX}{refresh_token}"))
            .await?)
    }

    async fn revoke(&self, refresh_token: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(format!("{LIVENESS_PREFIX}{refresh_token}"))
            .await?;
        Ok(removed > 0)
    }

    async fn blacklist(&self, access_jti: &str, ttl_seconds: i64) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                format!("{BLACKLIST_PREFIX}{access_jti}"),
                1,
                expiry(ttl_seconds),
            )
            .await?;
        Ok(())
    }

    async fn is_blacklisted(&self, access_jti: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn
            .exists(format!("{BLACKLIST_PREFIX}{access_jti}"))
            .await?)
    }
}

/// In-process store with per-key expiry instants. Expired keys read as absent.
#[derive(Default)]
pub struct MemorySessionStore {
    live: DashMap<String, DateTime<Utc>>,
    blacklisted: DashMap<String, DateTime<Utc>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn present(map: &DashMap<String, DateTime<Utc>>, key: &str) -> bool {
        let now = Utc::now();
        // Drop the read guard before a possible removal on the same shard.
        let expired = match map.get(key) {
            Some(expires_at) => *expires_at <= now,
            None => return false,
        };
        if expired {
            map.remove_if(key, |_, expires_at| *expires_at <= now);
            return false;
        }
        true
    }

    /// Number of unexpired liveness records.
    pub fn live_count(&self) -> usize {
        let now = Utc::now();
        self.live.iter().filter(|e| *e.value() > now).count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn record_liveness(
        &self,
        refresh_token: &str,
        ttl_seconds: i64,
    ) -> Result<(), AppError> {
        self.live.insert(
            refresh_token.to_string(),
            Utc::now() + Duration::seconds(ttl_seconds),
        );
        Ok(())
    }

    async fn is_live(&self, refresh_token: &str) -> Result<bool, AppError> {
        Ok(Self::present(&self.live, refresh_token))
    }

    async fn revoke(&self, refresh_token: &str) -> Result<bool, AppError> {
        let existed = Self::present(&self.live, refresh_token);
        self.live.remove(refresh_token);
        Ok(existed)
    }

    async fn blacklist(&self, access_jti: &str, ttl_seconds: i64) -> Result<(), AppError> {
        self.blacklisted.insert(
            access_jti.to_string(),
            Utc::now() + Duration::seconds(ttl_seconds),
        );
        Ok(())
    }

    async fn is_blacklisted(&self, access_jti: &str) -> Result<bool, AppError> {
        Ok(Self::present(&self.blacklisted, access_jti))
    }
}
