//! Registration, login, logout, and the current-user endpoint.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{StatusCode, header};
use axum::response::AppendHeaders;
use serde_json::{Value, json};

use crate::auth::{self, AuthUser, SessionHash};
use crate::error::{ApiError, db_conflict};
use crate::models::{LoginRequest, PublicUser, RegisterRequest};
use crate::state::AppState;

use super::{MAX_USERNAME_LENGTH, require_trimmed};

/// bcrypt is CPU-bound; hash/verify run on the blocking pool so the
/// request task is not stalled.
async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))
}

// ═══════════════════════════════════════════════════════════════════════
//  POST /api/register
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(post, path = "/api/register", tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created and logged in", body = PublicUser),
        (status = 400, description = "Validation error")))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let username = require_trimmed(&req.username, "Username", MAX_USERNAME_LENGTH)?.to_string();
    if req.password.trim().is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if state.storage.user_by_username(&username).await?.is_some() {
        return Err(ApiError::Validation("Username already exists".to_string()));
    }

    let password_hash = hash_password(req.password).await?;
    // The pre-check above can race a concurrent registration; the unique
    // index is the arbiter, and its violation is still a 400.
    let user = state
        .storage
        .create_user(&username, &password_hash, name, None)
        .await
        .map_err(|e| db_conflict(e, "Username already exists"))?;

    crate::audit::log_audit(
        state.storage.pool(),
        "register",
        json!({ "user_id": user.id, "username": user.username }),
        None,
    )
    .await;

    // Registration logs the caller in, matching the register-then-login flow
    // the client expects.
    let token = auth::issue_session(&state, user.id).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(
            header::SET_COOKIE,
            auth::session_cookie(&token, state.session_ttl.num_seconds()),
        )]),
        Json(PublicUser::from(user)),
    ))
}

// ═══════════════════════════════════════════════════════════════════════
//  POST /api/login
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(post, path = "/api/login", tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = PublicUser),
        (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let user = state
        .storage
        .user_by_username(req.username.trim())
        .await?
        .ok_or(ApiError::Unauthorized("Invalid username or password"))?;

    if !verify_password(req.password, user.password.clone()).await? {
        tracing::warn!(username = %user.username, "login failed: bad password");
        return Err(ApiError::Unauthorized("Invalid username or password"));
    }

    let token = auth::issue_session(&state, user.id).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok((
        StatusCode::OK,
        AppendHeaders([(
            header::SET_COOKIE,
            auth::session_cookie(&token, state.session_ttl.num_seconds()),
        )]),
        Json(PublicUser::from(user)),
    ))
}

// ═══════════════════════════════════════════════════════════════════════
//  POST /api/logout
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(post, path = "/api/logout", tag = "auth",
    responses((status = 200, description = "Session ended")))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHash>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state.storage.delete_session(&session.0).await?;

    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, auth::clear_session_cookie())]),
        Json(json!({ "status": "ok" })),
    ))
}

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/user
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/user", tag = "auth",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Not authenticated")))]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let row = state
        .storage
        .user_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthorized("Authentication required"))?;

    Ok(Json(serde_json::to_value(PublicUser::from(row)).map_err(
        |e| ApiError::Internal(anyhow::Error::new(e)),
    )?))
}
