//! Session-cookie authentication.
//!
//! A session is an opaque 32-byte random token delivered in an HttpOnly
//! cookie. Only the SHA-256 digest of the token is stored server-side, so a
//! leaked sessions table cannot be replayed. `require_auth` guards every
//! resource route: it resolves the cookie to a user and attaches a typed
//! `AuthUser` to the request, so handler code never sees an unauthenticated
//! request.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";

/// Identity of the authenticated caller, attached as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: uuid::Uuid,
    pub username: String,
    pub name: Option<String>,
}

/// Digest of the caller's session token, kept so logout can drop the row.
#[derive(Debug, Clone)]
pub struct SessionHash(pub String);

pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Set-Cookie value for a freshly issued session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Set-Cookie value that expires the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extract the raw session token from the request's Cookie header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        pair.trim()
            .strip_prefix(SESSION_COOKIE)?
            .strip_prefix('=')
            .map(|v| v.to_string())
    })
}

/// Issue a new session for `user_id` and return the raw token for the cookie.
pub async fn issue_session(state: &AppState, user_id: uuid::Uuid) -> sqlx::Result<String> {
    let token = new_session_token();
    let expires_at = chrono::Utc::now() + state.session_ttl;
    state
        .storage
        .create_session(&hash_token(&token), user_id, expires_at)
        .await?;
    Ok(token)
}

/// Middleware guarding all resource routes. Rejects with 401 before any
/// handler work when the session cookie is missing, unknown, or expired.
/// Rejections carry the same `{"message": ...}` body as handler errors.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = token_from_headers(request.headers()) else {
        return Err(ApiError::Unauthorized("Authentication required"));
    };

    let token_hash = hash_token(&token);
    let user = state
        .storage
        .session_user(&token_hash)
        .await?
        .ok_or(ApiError::Unauthorized("Authentication required"))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        name: user.name,
    });
    request.extensions_mut().insert(SessionHash(token_hash));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_deterministic_and_distinct_from_token() {
        let token = new_session_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn tokens_are_unique_and_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cookie_header_parsing_finds_the_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            "theme=dark; sid=abc123; other=1".parse().unwrap(),
        );
        assert_eq!(token_from_headers(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn cookie_header_without_session_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::COOKIE, "theme=dark; sidecar=x".parse().unwrap());
        assert_eq!(token_from_headers(&headers), None);

        let empty = HeaderMap::new();
        assert_eq!(token_from_headers(&empty), None);
    }
}
