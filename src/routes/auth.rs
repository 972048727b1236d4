// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::access_credential;
use crate::middleware::cookies::{cleared_cookies, session_cookies, REFRESH_COOKIE};
use crate::middleware::require_federation_secret;
use crate::routes::extract::ValidatedJson;
use crate::services::TokenPair;
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let federated = Router::new()
        .route("/auth/federated", post(federated_login))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_federation_secret,
        ));

    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .merge(federated)
}

/// Access-token check; mounted with the sliding-renewal routes.
pub fn access_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/access", get(access))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub nickname: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_id: i64,
}

/// Create a password account.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    let email = req.email.trim();
    let user = state
        .sessions
        .sign_up(email, req.nickname.trim(), &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(SignUpResponse { user_id: user.id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Password sign-in. Returns the pair as JSON and as cookies.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> Result<(CookieJar, Json<TokenPair>)> {
    let pair = state.sessions.sign_in(req.email.trim(), &req.password).await?;
    Ok(issue(&state, jar, pair))
}

#[derive(Debug, Deserialize, Validate)]
pub struct FederatedLoginRequest {
    #[validate(length(min = 1, max = 32))]
    pub provider: String,
    #[validate(length(min = 1, max = 255))]
    pub provider_id: String,
    #[validate(email)]
    pub email: String,
}

/// Identity asserted by the federation gateway after its own OAuth exchange.
async fn federated_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<FederatedLoginRequest>,
) -> Result<(CookieJar, Json<TokenPair>)> {
    let pair = state
        .sessions
        .social_login(&req.provider, &req.provider_id, req.email.trim())
        .await?;
    Ok(issue(&state, jar, pair))
}

#[derive(Debug, Default, Deserialize)]
struct RefreshTokenBody {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Refresh token from the cookie, else from an optional JSON body.
fn refresh_credential(jar: &CookieJar, body: &Bytes) -> Result<Option<String>> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE).filter(|c| !c.value().is_empty()) {
        return Ok(Some(cookie.value().to_string()));
    }
    if body.is_empty() {
        return Ok(None);
    }
    let parsed: RefreshTokenBody = serde_json::from_slice(body)
        .map_err(|e| AppError::ValidationFailed(format!("invalid body: {}", e)))?;
    Ok(parsed.refresh_token.filter(|t| !t.is_empty()))
}

/// Rotate the session.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<TokenPair>)> {
    let token = refresh_credential(&jar, &body)?.ok_or(AppError::Unauthenticated)?;
    let pair = state.sessions.refresh(&token).await?;
    Ok(issue(&state, jar, pair))
}

/// Revoke the session and clear cookies. Succeeds without credentials.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, StatusCode)> {
    let refresh = refresh_credential(&jar, &body)?;
    let access = access_credential(&headers);
    state
        .sessions
        .logout(refresh.as_deref(), access.as_deref())
        .await?;

    let jar = cleared_cookies(state.config.cookie_secure)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub user_id: i64,
    pub exp: i64,
}

/// Validate the presented access token.
async fn access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AccessResponse>> {
    let token = access_credential(&headers).ok_or(AppError::Unauthenticated)?;
    let claims = state.sessions.authenticate(&token).await?;
    Ok(Json(AccessResponse {
        user_id: claims.user_id()?,
        exp: claims.exp,
    }))
}

fn issue(state: &AppState, jar: CookieJar, pair: TokenPair) -> (CookieJar, Json<TokenPair>) {
    let jar = session_cookies(&pair, state.config.cookie_secure)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie));
    (jar, Json(pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn test_refresh_credential_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token=fromcookie"));
        let jar = CookieJar::from_headers(&headers);
        let body = Bytes::from_static(br#"{"refresh_token":"frombody"}"#);
        assert_eq!(
            refresh_credential(&jar, &body).unwrap().as_deref(),
            Some("fromcookie")
        );
    }

    #[test]
    fn test_refresh_credential_body_fallback() {
        let jar = CookieJar::new();
        let body = Bytes::from_static(br#"{"refresh_token":"frombody"}"#);
        assert_eq!(
            refresh_credential(&jar, &body).unwrap().as_deref(),
            Some("frombody")
        );
        assert_eq!(refresh_credential(&jar, &Bytes::new()).unwrap(), None);
        assert!(matches!(
            refresh_credential(&jar, &Bytes::from_static(b"not json")),
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_signup_validation() {
        let req = SignUpRequest {
            email: "not-an-email".to_string(),
            nickname: "n".to_string(),
            password: "secret1".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SignUpRequest {
            email: "a@x.com".to_string(),
            nickname: "n".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
