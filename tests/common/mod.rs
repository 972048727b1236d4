// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use auth_service::config::Config;
use auth_service::db::MemoryUserRepository;
use auth_service::routes::create_router;
use auth_service::services::{
    MemoryEventPublisher, MemorySessionStore, PasswordHasher, ProfileService, S3Presigner,
    SessionService, TokenManager,
};
use auth_service::AppState;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Router plus handles on the in-memory backends behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUserRepository>,
    pub sessions: Arc<MemorySessionStore>,
    pub events: Arc<MemoryEventPublisher>,
}

/// Create a test app with offline in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

/// Create a test app after adjusting the default test config.
#[allow(dead_code)]
pub fn create_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = Config::test_default();
    adjust(&mut config);

    let users = Arc::new(MemoryUserRepository::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let events = Arc::new(MemoryEventPublisher::new());
    let tokens = TokenManager::from_config(&config).expect("test token settings");

    let session_service = SessionService::new(
        users.clone(),
        sessions.clone(),
        events.clone(),
        tokens,
        // Cheap parameters; production defaults take far too long per test.
        PasswordHasher::with_params(1024, 1, 1),
    );
    let profiles = ProfileService::new(
        users.clone(),
        Arc::new(S3Presigner::new(config.storage.clone())),
    );

    let state = Arc::new(AppState {
        config,
        sessions: session_service,
        profiles,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        users,
        sessions,
        events,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign up and sign in, returning the token pair JSON.
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/auth/signup",
                serde_json::json!({"email": email, "nickname": "tester", "password": password}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self
            .send(json_request(
                "POST",
                "/auth/signin",
                serde_json::json!({"email": email, "password": password}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn bearer_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Value part of a `Set-Cookie` header.
#[allow(dead_code)]
pub fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn str_field(value: &Value, key: &str) -> String {
    value[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing {key} in {value}"))
        .to_string()
}
