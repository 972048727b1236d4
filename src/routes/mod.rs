// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;
pub mod extract;

use crate::middleware::{require_auth, sliding_refresh};
use crate::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);
    match HeaderValue::from_str(&state.config.frontend_url) {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!(
            frontend_url = %state.config.frontend_url,
            "FRONTEND_URL is not a valid origin; CORS disabled"
        ),
    }

    // Public routes (no auth required). The session endpoints issue or
    // clear cookies themselves and must not be renewed underneath.
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes =
        api::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Routes that consume an access token get sliding renewal, which runs
    // before the guard.
    let renewable_routes = protected_routes
        .merge(auth::access_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sliding_refresh,
        ));

    Router::new()
        .merge(public_routes)
        .merge(renewable_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
