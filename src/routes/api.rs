// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Profile, ProfilePatch, SecuritySetting};
use crate::routes::extract::ValidatedJson;
use crate::services::AvatarUpload;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via access token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/profile/avatar", patch(update_avatar))
        .route("/api/avatar/presign", get(avatar_presign))
        .route("/api/security", get(get_security))
        .route("/api/security/password", post(change_password))
        .route("/api/security/{key}", patch(toggle_security))
}

// ─── Identity ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i64,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
    })
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profiles.profile(user.user_id).await?))
}

/// Partial update; empty or missing fields keep their stored values.
async fn put_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(patch): ValidatedJson<ProfilePatch>,
) -> Result<Json<Profile>> {
    Ok(Json(
        state.profiles.save_profile(user.user_id, patch).await?,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AvatarRequest {
    #[validate(length(min = 1, max = 2048))]
    pub avatar: String,
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<AvatarRequest>,
) -> Result<StatusCode> {
    state
        .profiles
        .update_avatar(user.user_id, &req.avatar)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn avatar_presign(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AvatarUpload>> {
    Ok(Json(state.profiles.avatar_presign(user.user_id).await?))
}

// ─── Security settings ───────────────────────────────────────

#[derive(Serialize)]
pub struct SecurityResponse {
    pub settings: Vec<SecuritySetting>,
}

async fn get_security(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SecurityResponse>> {
    let settings = state.profiles.security(user.user_id).await?;
    Ok(Json(SecurityResponse { settings }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleRequest {
    pub enabled: bool,
}

async fn toggle_security(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
    ValidatedJson(req): ValidatedJson<ToggleRequest>,
) -> Result<StatusCode> {
    state
        .profiles
        .toggle_security(user.user_id, &key, req.enabled)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old: String,
    #[validate(length(min = 6, max = 128))]
    pub new: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    state
        .sessions
        .change_password(user.user_id, &req.old, &req.new)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
