// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use auth_service::error::AppError;
use axum::http::StatusCode;
use axum::response::IntoResponse;

mod common;

async fn status_and_code(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, common::json_body(response).await)
}

#[tokio::test]
async fn test_auth_errors_map_to_401() {
    for (err, code) in [
        (AppError::InvalidCredentials, "invalid_credentials"),
        (AppError::InvalidToken, "invalid_token"),
        (AppError::RefreshExpired, "refresh_expired"),
        (AppError::Unauthenticated, "unauthenticated"),
    ] {
        let (status, body) = status_and_code(err).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = status_and_code(AppError::NotFound("User 7 not found".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "User 7 not found");

    let (status, body) = status_and_code(AppError::ValidationFailed("bad email".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "bad email");

    let (status, _) = status_and_code(AppError::AlreadyExists).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_backend_errors_hide_details() {
    let (status, body) =
        status_and_code(AppError::Database("password=hunter2 connection refused".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let (status, body) = status_and_code(AppError::SessionStore("timeout".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());

    let (status, _) = status_and_code(AppError::Storage("bad endpoint".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = status_and_code(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_backend_classification() {
    assert!(AppError::SessionStore("connection reset".into()).is_backend());
    assert!(AppError::Database("pool timed out".into()).is_backend());
    assert!(!AppError::RefreshExpired.is_backend());
    assert!(!AppError::InvalidToken.is_backend());
    assert!(!AppError::ValidationFailed("bad".into()).is_backend());
}
