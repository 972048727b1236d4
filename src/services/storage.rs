// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avatar upload URLs for S3-compatible object storage.
//!
//! Clients upload directly to the bucket with a presigned `PUT`; this
//! service never touches object bytes. URLs are signed locally with AWS
//! Signature V4 (query-string form, path-style addressing).

use crate::config::StorageConfig;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Presigned upload lifetime.
pub const PRESIGN_EXPIRES_SECONDS: u64 = 15 * 60;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Where to upload an avatar and where it will be served from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AvatarUpload {
    pub put_url: String,
    pub public_url: String,
}

#[async_trait]
pub trait AvatarStorage: Send + Sync {
    async fn presign_avatar_put(&self, user_id: i64, email: &str)
        -> Result<AvatarUpload, AppError>;
}

/// Object key for a user's avatar: stable per (user, email).
pub fn avatar_key(user_id: i64, email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("avatars/{}_{}.jpg", user_id, hex::encode(&digest[..4]))
}

/// SigV4 presigner for one bucket.
#[derive(Debug, Clone)]
pub struct S3Presigner {
    config: StorageConfig,
}

impl S3Presigner {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Public URL of an object: `<public-endpoint>/<bucket>/<key>`.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_endpoint.trim_end_matches('/'),
            self.config.bucket,
            key
        )
    }

    /// Presigned public-read `PUT` for `key`, valid for 15 minutes from `now`.
    pub fn presign_put(&self, key: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        let host = endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(endpoint);
        if host.is_empty() || host.contains('/') {
            return Err(AppError::Storage(format!(
                "unusable storage endpoint {:?}",
                self.config.endpoint
            )));
        }

        let path = format!("/{}/{}", self.config.bucket, key);
        let query = presign(&PresignRequest {
            method: "PUT",
            host,
            path: &path,
            headers: &[("x-amz-acl", "public-read")],
            region: &self.config.region,
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            expires_seconds: PRESIGN_EXPIRES_SECONDS,
            now,
        })?;

        Ok(format!("{}{}?{}", endpoint, encode_path(&path), query))
    }
}

#[async_trait]
impl AvatarStorage for S3Presigner {
    async fn presign_avatar_put(
        &self,
        user_id: i64,
        email: &str,
    ) -> Result<AvatarUpload, AppError> {
        let key = avatar_key(user_id, email);
        let put_url = self.presign_put(&key, Utc::now())?;
        tracing::debug!(user_id, key = %key, "Presigned avatar upload");
        Ok(AvatarUpload {
            put_url,
            public_url: self.public_url(&key),
        })
    }
}

struct PresignRequest<'a> {
    method: &'a str,
    host: &'a str,
    /// Unencoded absolute path
    path: &'a str,
    /// Extra signed headers besides `host`, lowercase names
    headers: &'a [(&'a str, &'a str)],
    region: &'a str,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    expires_seconds: u64,
    now: DateTime<Utc>,
}

/// Build the signed query string (including `X-Amz-Signature`).
fn presign(req: &PresignRequest<'_>) -> Result<String, AppError> {
    let amz_date = req.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = req.now.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/s3/aws4_request", date, req.region);

    let mut headers: Vec<(String, String)> = vec![("host".to_string(), req.host.to_string())];
    headers.extend(
        req.headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string())),
    );
    headers.sort();
    let signed_headers = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    let mut params = vec![
        ("X-Amz-Algorithm", ALGORITHM.to_string()),
        (
            "X-Amz-Credential",
            format!("{}/{}", req.access_key_id, scope),
        ),
        ("X-Amz-Date", amz_date.clone()),
        ("X-Amz-Expires", req.expires_seconds.to_string()),
        ("X-Amz-SignedHeaders", signed_headers.clone()),
    ];
    params.sort();
    let canonical_query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        req.method,
        encode_path(req.path),
        canonical_query,
        canonical_headers,
        signed_headers,
        UNSIGNED_PAYLOAD
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_date = hmac(
        format!("AWS4{}", req.secret_access_key).as_bytes(),
        date.as_bytes(),
    )?;
    let k_region = hmac(&k_date, req.region.as_bytes())?;
    let k_service = hmac(&k_region, b"s3")?;
    let k_signing = hmac(&k_service, b"aws4_request")?;
    let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes())?);

    Ok(format!("{}&X-Amz-Signature={}", canonical_query, signature))
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// URI-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
