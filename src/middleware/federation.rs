// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret check for the federation gateway callback.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const FEDERATION_SECRET_HEADER: &str = "x-federation-secret";

/// Require the configured federation secret; with none configured, refuse everything.
pub async fn require_federation_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.federation_secret.as_deref() else {
        tracing::warn!("Federation callback called but no secret is configured");
        return Err(StatusCode::FORBIDDEN);
    };

    let presented = request
        .headers()
        .get(FEDERATION_SECRET_HEADER)
        .map(|h| h.as_bytes())
        .unwrap_or_default();

    if !bool::from(presented.ct_eq(expected.as_bytes())) {
        tracing::warn!("Blocked federation callback with invalid secret");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}
