//! Message listing and the send orchestration — the one multi-step
//! operation in the system.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use crate::auth::AuthUser;
use crate::completion::ChatTurn;
use crate::error::ApiError;
use crate::models::{Message, MessageRole, SendMessageRequest, SendMessageResponse, Usage};
use crate::state::AppState;

use super::{MAX_MESSAGE_LENGTH, load_owned_chat, require_trimmed};

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/chats/{id}/messages
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/chats/{id}/messages", tag = "messages",
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 200, description = "Messages, oldest first", body = [Message]),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such chat")))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let chat = load_owned_chat(&state, &id, &user).await?;
    let messages = state.storage.messages_for_chat(chat.id).await?;
    Ok(Json(messages.into_iter().map(Message::from).collect()))
}

// ═══════════════════════════════════════════════════════════════════════
//  POST /api/chats/{id}/messages
// ═══════════════════════════════════════════════════════════════════════

/// Send flow: persist the user message, replay the full history to the
/// completion gateway, persist the reply, return both plus usage.
///
/// There is deliberately no transaction spanning these steps: when the
/// gateway fails, the user message stays persisted with no assistant reply,
/// and that is a valid chat state, not corruption. No retry is attempted.
#[utoipa::path(post, path = "/api/chats/{id}/messages", tag = "messages",
    params(("id" = String, Path, description = "Chat UUID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "User and assistant messages persisted", body = SendMessageResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such chat"),
        (status = 500, description = "Provider or transport failure")))]
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let chat = load_owned_chat(&state, &id, &user).await?;
    require_trimmed(&req.content, "Content", MAX_MESSAGE_LENGTH)?;

    let user_message = state
        .storage
        .create_message(chat.id, MessageRole::User, &req.content)
        .await?;

    // History now includes the message persisted above.
    let history = state.storage.messages_for_chat(chat.id).await?;
    let turns: Vec<ChatTurn> = history
        .iter()
        .map(|m| ChatTurn {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    let completion = state.completions.complete(&turns).await?;

    let assistant_message = state
        .storage
        .create_message(chat.id, MessageRole::Assistant, &completion.content)
        .await?;

    tracing::info!(
        chat_id = %chat.id,
        total_tokens = completion.total_tokens,
        model = %completion.model,
        "message exchange completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            user_message: Message::from(user_message),
            assistant_message: Message::from(assistant_message),
            usage: Usage {
                prompt_tokens: completion.prompt_tokens,
                completion_tokens: completion.completion_tokens,
                total_tokens: completion.total_tokens,
            },
            model: completion.model,
        }),
    ))
}
