//! Handler modules for the GroqChat API.
//!
//! - `auth` — registration, login, logout, current user
//! - `chats` — chat CRUD scoped to the authenticated owner
//! - `messages` — message listing and the send orchestration
//! - `models` — provider model list proxy
//! - `health` — health and readiness endpoints

pub mod auth;
pub mod chats;
pub mod health;
pub mod messages;
pub mod models;

// Re-export everything (including utoipa __path_* types needed by OpenApi derive)
pub use auth::*;
pub use chats::*;
pub use health::*;
pub use messages::*;
pub use models::*;

// ── Shared constants ──────────────────────────────────────────────────────

pub(crate) const MAX_MESSAGE_LENGTH: usize = 100_000;
pub(crate) const MAX_TITLE_LENGTH: usize = 500;
pub(crate) const MAX_USERNAME_LENGTH: usize = 64;

// ── Shared helpers ────────────────────────────────────────────────────────

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::ChatRow;
use crate::state::AppState;

/// Validate that a field is non-empty after trimming and within `max` chars.
/// Returns the trimmed value.
pub(crate) fn require_trimmed<'a>(
    value: &'a str,
    field: &'static str,
    max: usize,
) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(trimmed)
}

/// Resolve a chat id path segment to a chat the caller owns.
///
/// The existence check runs first: an unknown id is 404 even when the caller
/// owns nothing, and 403 is reserved for chats that exist under another
/// owner.
pub(crate) async fn load_owned_chat(
    state: &AppState,
    id: &str,
    user: &AuthUser,
) -> Result<ChatRow, ApiError> {
    let chat_id: uuid::Uuid = id
        .parse()
        .map_err(|_| ApiError::Validation("Invalid chat id".to_string()))?;

    let chat = state
        .storage
        .chat_by_id(chat_id)
        .await?
        .ok_or(ApiError::NotFound("Chat"))?;

    if chat.user_id != user.id {
        tracing::warn!(
            chat_id = %chat.id,
            caller = %user.id,
            "ownership check failed"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(chat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_trimmed_counts_characters_not_bytes() {
        // 10 two-byte characters — within a 10-character limit.
        let title = "é".repeat(10);
        assert_eq!(require_trimmed(&title, "Title", 10).unwrap(), title);
        assert!(require_trimmed(&title, "Title", 9).is_err());
    }

    #[test]
    fn require_trimmed_rejects_blank_and_returns_trimmed() {
        assert!(require_trimmed("   ", "Title", 10).is_err());
        assert_eq!(require_trimmed("  hi  ", "Title", 10).unwrap(), "hi");
    }
}
