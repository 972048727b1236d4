// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed access/refresh token issuance and parsing.
//!
//! Tokens are HS256 JWTs signed with one process-wide secret. Parsing only
//! establishes cryptographic validity and expiry; liveness lives in the
//! session store and is checked by the caller.

use crate::config::{Config, MIN_SECRET_LEN};
use crate::error::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Which half of a token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, decimal)
    pub sub: String,
    /// Unique token id
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub typ: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Seconds until expiry, negative once expired.
    pub fn remaining_seconds(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Freshly minted access + refresh tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access TTL in seconds
    pub expires_in: i64,
    /// Refresh TTL in seconds
    pub refresh_expires_in: i64,
    #[serde(skip)]
    pub access_jti: String,
    #[serde(skip)]
    pub access_expires_at: i64,
}

/// Mints and verifies tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Build a manager, rejecting short secrets and non-positive TTLs.
    pub fn new(
        secret: &[u8],
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> anyhow::Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("signing secret must be at least {} bytes", MIN_SECRET_LEN);
        }
        if access_ttl_seconds <= 0 || refresh_ttl_seconds <= 0 {
            anyhow::bail!("token TTLs must be positive");
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.jwt_secret,
            config.access_ttl_seconds,
            config.refresh_ttl_seconds,
        )
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Mint a new pair for `user_id`, each token with its own jti.
    pub fn generate(&self, user_id: i64) -> Result<TokenPair, AppError> {
        let now = chrono::Utc::now().timestamp();
        let access = self.claims(user_id, TokenKind::Access, now, self.access_ttl_seconds);
        let refresh = self.claims(user_id, TokenKind::Refresh, now, self.refresh_ttl_seconds);

        let pair = TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            token_type: "bearer",
            expires_in: self.access_ttl_seconds,
            refresh_expires_in: self.refresh_ttl_seconds,
            access_jti: access.jti,
            access_expires_at: access.exp,
        };

        tracing::debug!(
            user_id,
            access_exp = pair.access_expires_at,
            "Issued token pair"
        );
        Ok(pair)
    }

    /// Verify signature, structure and expiry. Does not consult the session store.
    pub fn parse(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        // jsonwebtoken accepts exp == now; treat that instant as expired.
        if data.claims.exp <= chrono::Utc::now().timestamp() {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }

    /// Parse and require a specific token kind.
    pub fn parse_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let claims = self.parse(token)?;
        if claims.typ != kind {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    fn claims(&self, user_id: i64, typ: TokenKind, now: i64, ttl: i64) -> Claims {
        Claims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl,
            typ,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit_test_secret_value!!";

    fn manager() -> TokenManager {
        TokenManager::new(SECRET, 900, 30 * 24 * 3600).unwrap()
    }

    #[test]
    fn test_generate_parse_roundtrip() {
        let mgr = manager();
        let before = chrono::Utc::now().timestamp();
        let pair = mgr.generate(42).unwrap();

        let access = mgr.parse(&pair.access_token).unwrap();
        assert_eq!(access.user_id().unwrap(), 42);
        assert_eq!(access.typ, TokenKind::Access);
        assert_eq!(access.jti, pair.access_jti);
        assert!(access.exp - before >= 900 && access.exp - before <= 901);

        let refresh = mgr.parse(&pair.refresh_token).unwrap();
        assert_eq!(refresh.typ, TokenKind::Refresh);
        assert_ne!(refresh.jti, access.jti);
        assert_eq!(pair.expires_in, 900);
        assert_eq!(pair.refresh_expires_in, 30 * 24 * 3600);
    }

    #[test]
    fn test_pairs_are_unique() {
        let mgr = manager();
        let a = mgr.generate(1).unwrap();
        let b = mgr.generate(1).unwrap();
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let pair = manager().generate(1).unwrap();
        let other = TokenManager::new(b"another_secret_of_length", 900, 3600).unwrap();
        assert!(matches!(
            other.parse(&pair.access_token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_rejects_expired_and_garbage() {
        let mgr = manager();
        let now = chrono::Utc::now().timestamp();
        let expired = Claims {
            sub: "1".to_string(),
            jti: "x".to_string(),
            iat: now - 100,
            exp: now,
            typ: TokenKind::Access,
        };
        let token = mgr.sign(&expired).unwrap();
        assert!(matches!(mgr.parse(&token), Err(AppError::InvalidToken)));
        assert!(matches!(mgr.parse("not.a.jwt"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_parse_kind_enforces_type() {
        let mgr = manager();
        let pair = mgr.generate(5).unwrap();
        assert!(mgr.parse_kind(&pair.access_token, TokenKind::Access).is_ok());
        assert!(matches!(
            mgr.parse_kind(&pair.refresh_token, TokenKind::Access),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_construction_rejects_bad_settings() {
        assert!(TokenManager::new(b"short", 900, 3600).is_err());
        assert!(TokenManager::new(SECRET, 0, 3600).is_err());
        assert!(TokenManager::new(SECRET, 900, -1).is_err());
    }
}
