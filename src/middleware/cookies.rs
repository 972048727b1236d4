// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie construction.

use crate::services::TokenPair;
use axum_extra::extract::cookie::{Cookie, SameSite};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

fn session_cookie(name: &'static str, value: String, max_age: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Access and refresh cookies for a freshly issued pair.
pub fn session_cookies(pair: &TokenPair, secure: bool) -> [Cookie<'static>; 2] {
    [
        session_cookie(
            ACCESS_COOKIE,
            pair.access_token.clone(),
            pair.expires_in,
            secure,
        ),
        session_cookie(
            REFRESH_COOKIE,
            pair.refresh_token.clone(),
            pair.refresh_expires_in,
            secure,
        ),
    ]
}

/// Expired cookies that clear both session cookies.
pub fn cleared_cookies(secure: bool) -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_COOKIE, String::new(), 0, secure),
        session_cookie(REFRESH_COOKIE, String::new(), 0, secure),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TokenManager;

    #[test]
    fn test_session_cookie_attributes() {
        let pair = TokenManager::new(b"cookie_test_secret_key", 900, 3600)
            .unwrap()
            .generate(1)
            .unwrap();
        let [access, refresh] = session_cookies(&pair, false);

        let access = access.to_string();
        assert!(access.starts_with("access_token="));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("Max-Age=900"));
        assert!(!access.contains("Secure"));

        let refresh = refresh.to_string();
        assert!(refresh.starts_with("refresh_token="));
        assert!(refresh.contains("Max-Age=3600"));
    }

    #[test]
    fn test_cleared_cookies_expire_immediately() {
        for cookie in cleared_cookies(true) {
            let cookie = cookie.to_string();
            assert!(cookie.contains("Max-Age=0"));
            assert!(cookie.contains("Secure"));
        }
    }
}
