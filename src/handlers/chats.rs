//! Chat CRUD, always scoped to the authenticated owner.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Chat, CreateChatRequest, RenameChatRequest};
use crate::state::AppState;

use super::{MAX_TITLE_LENGTH, load_owned_chat, require_trimmed};

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/chats
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/chats", tag = "chats",
    responses((status = 200, description = "Caller's chats, newest first", body = [Chat])))]
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats = state.storage.chats_for_user(user.id).await?;
    Ok(Json(chats.into_iter().map(Chat::from).collect()))
}

// ═══════════════════════════════════════════════════════════════════════
//  POST /api/chats
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(post, path = "/api/chats", tag = "chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = Chat),
        (status = 400, description = "Validation error")))]
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let title = require_trimmed(&req.title, "Title", MAX_TITLE_LENGTH)?;

    let chat = state.storage.create_chat(user.id, title).await?;
    tracing::info!(chat_id = %chat.id, user_id = %user.id, "chat created");

    Ok((StatusCode::CREATED, Json(Chat::from(chat))))
}

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/chats/{id}
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/chats/{id}", tag = "chats",
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 200, description = "Chat", body = Chat),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such chat")))]
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Chat>, ApiError> {
    let chat = load_owned_chat(&state, &id, &user).await?;
    Ok(Json(Chat::from(chat)))
}

// ═══════════════════════════════════════════════════════════════════════
//  DELETE /api/chats/{id}
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(delete, path = "/api/chats/{id}", tag = "chats",
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 204, description = "Chat and its messages deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such chat")))]
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    let chat = load_owned_chat(&state, &id, &user).await?;

    let deleted = state.storage.delete_chat(chat.id).await?;
    if deleted > 0 {
        crate::audit::log_audit(
            state.storage.pool(),
            "delete_chat",
            json!({ "chat_id": chat.id, "user_id": user.id }),
            None,
        )
        .await;
    }

    Ok(StatusCode::NO_CONTENT)
}

// ═══════════════════════════════════════════════════════════════════════
//  PATCH /api/chats/{id}
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(patch, path = "/api/chats/{id}", tag = "chats",
    params(("id" = String, Path, description = "Chat UUID")),
    request_body = RenameChatRequest,
    responses(
        (status = 200, description = "Renamed chat", body = Chat),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such chat")))]
pub async fn rename_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RenameChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    let chat = load_owned_chat(&state, &id, &user).await?;
    let title = require_trimmed(&req.title, "Title", MAX_TITLE_LENGTH)?;

    let renamed = state
        .storage
        .rename_chat(chat.id, title)
        .await?
        .ok_or(ApiError::NotFound("Chat"))?;

    Ok(Json(Chat::from(renamed)))
}
