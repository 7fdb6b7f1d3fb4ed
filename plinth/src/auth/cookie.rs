// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::HttpRequest;

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Session cookie carrying the token. Lives as long as the session itself.
pub fn session_cookie<'a>(token: &str, ttl: chrono::Duration, secure: bool) -> Cookie<'a> {
    Cookie::build(SESSION_COOKIE_NAME, token.to_string())
        .path("/")
        .secure(secure)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .finish()
}

/// Replacement cookie that makes the browser drop the session immediately.
pub fn clear_session_cookie<'a>(secure: bool) -> Cookie<'a> {
    Cookie::build(SESSION_COOKIE_NAME, "")
        .path("/")
        .secure(secure)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(-1))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish()
}

/// Session token carried by the request, if any. Empty values count as absent.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_required_attributes() {
        let cookie = session_cookie("abc", chrono::Duration::hours(24), true);
        let rendered = cookie.to_string();
        assert!(rendered.starts_with("session_id=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=86400"));
    }

    #[test]
    fn cleared_cookie_is_empty_and_expired() {
        let rendered = clear_session_cookie(false).to_string();
        assert!(rendered.starts_with("session_id=;"));
        assert!(rendered.contains("Max-Age=-1"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn token_is_read_from_request_cookie() {
        let req = actix_web::test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "tok"))
            .to_http_request();
        assert_eq!(session_token(&req).as_deref(), Some("tok"));

        let empty = actix_web::test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, ""))
            .to_http_request();
        assert_eq!(session_token(&empty), None);
    }
}
