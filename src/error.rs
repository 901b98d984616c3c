//! API error taxonomy.
//!
//! Handlers return `Result<_, ApiError>`; the `IntoResponse` impl maps each
//! kind to its HTTP status and a JSON `{ "message": ... }` body. Upstream
//! errors additionally carry a `details` field. Internal errors are logged
//! in full but surface only a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::completion::CompletionError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing required field — 400.
    #[error("{0}")]
    Validation(String),

    /// No or invalid session, or bad credentials — 401.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Session valid but the resource belongs to someone else — 403.
    #[error("Not authorized to access this resource")]
    Forbidden,

    /// Resource id does not resolve — 404. Checked before ownership.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Completion provider returned non-success or was unreachable — 500
    /// with a `details` field describing the failure.
    #[error("upstream provider error: {details}")]
    Upstream {
        status: Option<u16>,
        details: String,
    },

    /// Anything else — 500, generic message, no internals leaked.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "message": "Not authorized to access this resource" }),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "message": format!("{what} not found") }),
            ),
            ApiError::Upstream { status, details } => {
                tracing::error!(provider_status = ?status, "upstream provider error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error sending message", "details": details }),
                )
            }
            ApiError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(anyhow::Error::new(err))
    }
}

/// Map a unique-constraint violation (Postgres 23505) to a validation error
/// carrying `message`. Lets check-then-insert races surface the same 400 as
/// the sequential duplicate check. Any other error stays internal.
pub fn db_conflict(err: sqlx::Error, message: &str) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return ApiError::Validation(message.to_string());
        }
    }
    ApiError::from(err)
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::MissingCredential => ApiError::Upstream {
                status: None,
                details: "GROQ_API_KEY is not configured".to_string(),
            },
            CompletionError::Provider { status, body } => ApiError::Upstream {
                status: Some(status),
                details: format!("provider returned {status}: {body}"),
            },
            CompletionError::Transport(e) => ApiError::Upstream {
                status: None,
                details: format!("provider request failed: {e}"),
            },
            CompletionError::Malformed(msg) => ApiError::Upstream {
                status: None,
                details: format!("provider response malformed: {msg}"),
            },
        }
    }
}
