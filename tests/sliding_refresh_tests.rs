// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sliding session renewal tests.
//!
//! Access tokens are issued with a 10 minute lifetime so every fresh token
//! is already inside the 15 minute renewal window.

use auth_service::services::SessionStore;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};

mod common;

use common::{cookie_value, find_cookie, json_body, set_cookie_headers, str_field, TestApp};

fn short_lived_app() -> TestApp {
    common::create_test_app_with(|config| config.access_ttl_seconds = 600)
}

fn cookie_request(uri: &str, access: &str, refresh: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(
            header::COOKIE,
            format!("access_token={access}; refresh_token={refresh}"),
        )
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_near_expiry_session_is_renewed() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    let response = app.send(cookie_request("/api/me", &access, &refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let new_access = cookie_value(&find_cookie(&set_cookies, "access_token"));
    let new_refresh = cookie_value(&find_cookie(&set_cookies, "refresh_token"));
    assert_ne!(new_access, access);
    assert_ne!(new_refresh, refresh);
    assert_eq!(json_body(response).await["user_id"], 1);

    assert!(!app.sessions.is_live(&refresh).await.unwrap());
    assert!(app.sessions.is_live(&new_refresh).await.unwrap());
}

#[tokio::test]
async fn test_bearer_request_renewed_with_refresh_cookie() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let refresh = str_field(&pair, "refresh_token");

    let response = app
        .send(
            Request::builder()
                .uri("/api/profile")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", str_field(&pair, "access_token")),
                )
                .header(header::COOKIE, format!("refresh_token={refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookies = set_cookie_headers(&response);
    find_cookie(&set_cookies, "access_token");
    assert!(!app.sessions.is_live(&refresh).await.unwrap());
}

#[tokio::test]
async fn test_fresh_session_left_alone() {
    let app = common::create_test_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let refresh = str_field(&pair, "refresh_token");

    let response = app
        .send(cookie_request(
            "/api/me",
            &str_field(&pair, "access_token"),
            &refresh,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_headers(&response).is_empty());
    assert!(app.sessions.is_live(&refresh).await.unwrap());
}

#[tokio::test]
async fn test_failed_renewal_is_not_fatal() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    app.state.sessions.revoke_refresh(&refresh).await.unwrap();

    let response = app.send(cookie_request("/api/me", &access, &refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_second_racing_request_keeps_stale_token() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    let first = app.send(cookie_request("/api/me", &access, &refresh)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let renewed = cookie_value(&find_cookie(&set_cookie_headers(&first), "refresh_token"));

    // Same stale credentials again: renewal fails, request still served,
    // and the session minted by the first request survives.
    let second = app.send(cookie_request("/api/me", &access, &refresh)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert!(set_cookie_headers(&second).is_empty());
    assert!(app.sessions.is_live(&renewed).await.unwrap());
}

#[tokio::test]
async fn test_renewal_without_refresh_cookie_does_nothing() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;

    let response = app
        .send(common::bearer_request(
            "GET",
            "/api/me",
            &str_field(&pair, "access_token"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_headers(&response).is_empty());
}

fn cookie_post(uri: &str, access: &str, refresh: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::COOKIE,
            format!("access_token={access}; refresh_token={refresh}"),
        )
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_explicit_refresh_inside_window_sets_one_live_cookie() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    let response = app.send(cookie_post("/auth/refresh", &access, &refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let refresh_cookies: Vec<_> = set_cookies
        .iter()
        .filter(|c| c.starts_with("refresh_token="))
        .collect();
    assert_eq!(refresh_cookies.len(), 1, "{set_cookies:?}");
    let cookie_refresh = cookie_value(refresh_cookies[0]);

    let body = json_body(response).await;
    assert_eq!(cookie_refresh, str_field(&body, "refresh_token"));
    assert!(app.sessions.is_live(&cookie_refresh).await.unwrap());
    assert!(!app.sessions.is_live(&refresh).await.unwrap());
}

#[tokio::test]
async fn test_logout_inside_window_only_clears_cookies() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    let response = app.send(cookie_post("/auth/logout", &access, &refresh)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    assert_eq!(set_cookies.len(), 2, "{set_cookies:?}");
    for cookie in &set_cookies {
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
        assert_eq!(cookie_value(cookie), "");
    }
    assert!(!app.sessions.is_live(&refresh).await.unwrap());
}

#[tokio::test]
async fn test_access_check_inside_window_is_renewed() {
    let app = short_lived_app();
    let pair = app.register("alice@example.com", "secret1").await;
    let access = str_field(&pair, "access_token");
    let refresh = str_field(&pair, "refresh_token");

    let response = app.send(cookie_request("/auth/access", &access, &refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_refresh = cookie_value(&find_cookie(&set_cookie_headers(&response), "refresh_token"));
    assert!(app.sessions.is_live(&new_refresh).await.unwrap());
}
