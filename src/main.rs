// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth Service API Server
//!
//! Issues and rotates dual-token sessions backed by Postgres (accounts,
//! profiles) and Redis (session liveness, access blacklist, events).

use auth_service::{
    config::Config,
    db::PgUserRepository,
    services::{
        PasswordHasher, ProfileService, RedisEventPublisher, RedisSessionStore, S3Presigner,
        SessionService, TokenManager,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting auth service");

    // Accounts and profiles (migrations run on connect)
    let users = Arc::new(PgUserRepository::connect(&config.database_url).await?);
    tracing::info!("Postgres connected");

    // One multiplexed Redis connection for sessions and events
    let redis = redis::Client::open(config.redis_url.as_str())?
        .get_connection_manager()
        .await?;
    tracing::info!("Redis connected");

    let tokens = TokenManager::from_config(&config)?;
    let sessions = SessionService::new(
        users.clone(),
        Arc::new(RedisSessionStore::new(redis.clone())),
        Arc::new(RedisEventPublisher::new(redis, config.event_stream.clone())),
        tokens,
        PasswordHasher::default(),
    );
    let profiles = ProfileService::new(users, Arc::new(S3Presigner::new(config.storage.clone())));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        sessions,
        profiles,
    });

    // Build router
    let app = auth_service::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auth_service=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
