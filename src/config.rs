// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything here is read once at startup and handed to the components
//! that need it. Nothing reads the environment after `from_env` returns.

use std::env;

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_SLIDING_THRESHOLD_SECONDS: i64 = 15 * 60;

/// Object storage settings for avatar uploads.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// S3-compatible API endpoint used for signing (e.g. `https://s3.example.net`)
    pub endpoint: String,
    /// Base URL clients use to fetch uploaded objects
    pub public_endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string
    pub database_url: String,
    /// Redis connection string (session store and event stream)
    pub redis_url: String,
    /// HS256 signing secret for access and refresh tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_ttl_seconds: i64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_seconds: i64,
    /// Remaining access lifetime below which sessions are renewed in-flight
    pub sliding_threshold_seconds: i64,
    /// Redis stream receiving user lifecycle events
    pub event_stream: String,
    pub storage: StorageConfig,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Shared secret the federation gateway presents; `None` disables the route
    pub federation_secret: Option<String>,
    /// Whether auth cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    pub request_timeout_seconds: u64,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            database_url: "postgres://localhost/auth_test".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum".to_vec(),
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            sliding_threshold_seconds: DEFAULT_SLIDING_THRESHOLD_SECONDS,
            event_stream: "auth-events".to_string(),
            storage: StorageConfig {
                bucket: "avatars".to_string(),
                region: "us-east-1".to_string(),
                endpoint: "http://localhost:9000".to_string(),
                public_endpoint: "http://localhost:9000".to_string(),
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            },
            frontend_url: "http://localhost:3000".to_string(),
            federation_secret: Some("test_federation_secret".to_string()),
            cookie_secure: false,
            request_timeout_seconds: 30,
            port: 8080,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development. Missing required
    /// variables and unusable token settings are reported here so the
    /// process refuses to start instead of failing per request.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_endpoint = required("S3_ENDPOINT")?;
        let storage = StorageConfig {
            bucket: required("S3_BUCKET")?,
            region: required("S3_REGION")?,
            public_endpoint: env::var("S3_PUBLIC_ENDPOINT")
                .unwrap_or_else(|_| storage_endpoint.clone()),
            endpoint: storage_endpoint,
            access_key_id: required("S3_ACCESS_KEY_ID")?,
            secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
        };

        let config = Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            jwt_secret: required("JWT_SECRET")?.into_bytes(),
            access_ttl_seconds: int_or("ACCESS_TTL_SECONDS", DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl_seconds: int_or("REFRESH_TTL_SECONDS", DEFAULT_REFRESH_TTL_SECONDS),
            sliding_threshold_seconds: int_or(
                "SLIDING_REFRESH_THRESHOLD_SECONDS",
                DEFAULT_SLIDING_THRESHOLD_SECONDS,
            ),
            event_stream: env::var("EVENT_STREAM").unwrap_or_else(|_| "auth-events".to_string()),
            storage,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            federation_secret: env::var("FEDERATION_SECRET")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the token settings every other component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort(MIN_SECRET_LEN));
        }
        if self.access_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("ACCESS_TTL_SECONDS must be positive"));
        }
        if self.refresh_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("REFRESH_TTL_SECONDS must be positive"));
        }
        if self.sliding_threshold_seconds < 0 {
            return Err(ConfigError::Invalid(
                "SLIDING_REFRESH_THRESHOLD_SECONDS must not be negative",
            ));
        }
        Ok(())
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Integer override that silently keeps the default when unset or unparseable.
fn int_or(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("JWT_SECRET must be at least {0} bytes")]
    SecretTooShort(usize),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
