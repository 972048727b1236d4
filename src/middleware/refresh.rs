// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sliding session renewal.
//!
//! When a request carries an access token that is still valid but close to
//! expiry, together with a refresh cookie, the session is rotated before the
//! handler runs. The request's own credentials are rewritten so downstream
//! layers see the new identity, and the new pair is returned as cookies.
//! Renewal failure never fails the request.

use crate::middleware::auth::{access_credential, bearer_token};
use crate::middleware::cookies::{session_cookies, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::services::{TokenKind, TokenPair};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

pub async fn sliding_refresh(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let renewed = renew_if_due(&state, request.headers()).await;

    if let Some(pair) = &renewed {
        rewrite_request_credentials(request.headers_mut(), pair);
    }

    let mut response = next.run(request).await;

    if let Some(pair) = renewed {
        for cookie in session_cookies(&pair, state.config.cookie_secure) {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(error = %e, "Unencodable session cookie"),
            }
        }
    }

    response
}

/// Rotate the session when the access token is inside the renewal window.
async fn renew_if_due(state: &AppState, headers: &HeaderMap) -> Option<TokenPair> {
    let access = access_credential(headers)?;
    let refresh = CookieJar::from_headers(headers)
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())?;

    let claims = state
        .sessions
        .tokens()
        .parse_kind(&access, TokenKind::Access)
        .ok()?;
    let remaining = claims.remaining_seconds(chrono::Utc::now().timestamp());
    if remaining >= state.config.sliding_threshold_seconds {
        return None;
    }

    match state.sessions.refresh(&refresh).await {
        Ok(pair) => {
            tracing::debug!(sub = %claims.sub, remaining, "Sliding refresh renewed session");
            Some(pair)
        }
        Err(e) if e.is_backend() => {
            tracing::warn!(sub = %claims.sub, error = %e, "Sliding refresh failed");
            None
        }
        Err(e) => {
            tracing::debug!(sub = %claims.sub, error = %e, "Sliding refresh skipped");
            None
        }
    }
}

/// Swap the new pair into the request's `Authorization` and `Cookie` headers.
fn rewrite_request_credentials(headers: &mut HeaderMap, pair: &TokenPair) {
    if bearer_token(headers).is_some() {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", pair.access_token)) {
            headers.insert(header::AUTHORIZATION, value);
        }
    }

    let jar = CookieJar::from_headers(headers)
        .add(Cookie::new(ACCESS_COOKIE, pair.access_token.clone()))
        .add(Cookie::new(REFRESH_COOKIE, pair.refresh_token.clone()));
    let cookie_header = jar
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect::<Vec<_>>()
        .join("; ");

    if let Ok(value) = HeaderValue::from_str(&cookie_header) {
        headers.remove(header::COOKIE);
        headers.insert(header::COOKIE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TokenManager;

    #[test]
    fn test_rewrite_request_credentials() {
        let pair = TokenManager::new(b"sliding_test_secret_key", 900, 3600)
            .unwrap()
            .generate(9)
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer old"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=old; refresh_token=old"),
        );

        rewrite_request_credentials(&mut headers, &pair);

        assert_eq!(
            bearer_token(&headers).as_deref(),
            Some(pair.access_token.as_str())
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get(ACCESS_COOKIE).unwrap().value(), pair.access_token);
        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), pair.refresh_token);
        assert_eq!(jar.get("theme").unwrap().value(), "dark");
    }

    #[test]
    fn test_cookie_only_request_gets_no_authorization_header() {
        let pair = TokenManager::new(b"sliding_test_secret_key", 900, 3600)
            .unwrap()
            .generate(9)
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=old; refresh_token=old"),
        );

        rewrite_request_credentials(&mut headers, &pair);
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }
}
