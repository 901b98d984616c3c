//! Relational store access — users, chats, messages, sessions.
//!
//! A `Storage` value is constructed once at startup and injected into the
//! handler layer through `AppState`; there is no ambient singleton. Each
//! method is a single point query or mutation; consistency is delegated to
//! Postgres row-level guarantees. Cascade deletes (chat → messages,
//! user → chats/sessions) live in the schema, not here.

use sqlx::PgPool;

use crate::models::{ChatRow, MessageRole, MessageRow, UserRow};

#[derive(Clone)]
pub struct Storage {
    db: PgPool,
}

impl Storage {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.db).await.is_ok()
    }

    // ── Users ───────────────────────────────────────────────────────────

    pub async fn user_by_id(&self, id: uuid::Uuid) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, name, avatar, created_at \
             FROM gc_users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn user_by_username(&self, username: &str) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, name, avatar, created_at \
             FROM gc_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> sqlx::Result<UserRow> {
        sqlx::query_as::<_, UserRow>(
            "INSERT INTO gc_users (username, password, name, avatar) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, password, name, avatar, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(name)
        .bind(avatar)
        .fetch_one(&self.db)
        .await
    }

    // ── Chats ───────────────────────────────────────────────────────────

    /// All chats owned by a user, most recently created first.
    pub async fn chats_for_user(&self, user_id: uuid::Uuid) -> sqlx::Result<Vec<ChatRow>> {
        sqlx::query_as::<_, ChatRow>(
            "SELECT id, user_id, title, created_at FROM gc_chats \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn chat_by_id(&self, id: uuid::Uuid) -> sqlx::Result<Option<ChatRow>> {
        sqlx::query_as::<_, ChatRow>(
            "SELECT id, user_id, title, created_at FROM gc_chats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn create_chat(&self, user_id: uuid::Uuid, title: &str) -> sqlx::Result<ChatRow> {
        sqlx::query_as::<_, ChatRow>(
            "INSERT INTO gc_chats (user_id, title) VALUES ($1, $2) \
             RETURNING id, user_id, title, created_at",
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.db)
        .await
    }

    /// Messages go with the chat via the schema's ON DELETE CASCADE.
    pub async fn delete_chat(&self, id: uuid::Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM gc_chats WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn rename_chat(
        &self,
        id: uuid::Uuid,
        title: &str,
    ) -> sqlx::Result<Option<ChatRow>> {
        sqlx::query_as::<_, ChatRow>(
            "UPDATE gc_chats SET title = $1 WHERE id = $2 \
             RETURNING id, user_id, title, created_at",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Full message history of a chat in chronological order.
    pub async fn messages_for_chat(&self, chat_id: uuid::Uuid) -> sqlx::Result<Vec<MessageRow>> {
        sqlx::query_as::<_, MessageRow>(
            "SELECT id, chat_id, role, content, timestamp FROM gc_messages \
             WHERE chat_id = $1 ORDER BY timestamp ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn create_message(
        &self,
        chat_id: uuid::Uuid,
        role: MessageRole,
        content: &str,
    ) -> sqlx::Result<MessageRow> {
        sqlx::query_as::<_, MessageRow>(
            "INSERT INTO gc_messages (chat_id, role, content) VALUES ($1, $2, $3) \
             RETURNING id, chat_id, role, content, timestamp",
        )
        .bind(chat_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.db)
        .await
    }

    // ── Sessions ────────────────────────────────────────────────────────

    pub async fn create_session(
        &self,
        token_hash: &str,
        user_id: uuid::Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO gc_sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Resolve a live session to its user. Expired sessions do not resolve.
    pub async fn session_user(&self, token_hash: &str) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.username, u.password, u.name, u.avatar, u.created_at \
             FROM gc_sessions s JOIN gc_users u ON u.id = s.user_id \
             WHERE s.token_hash = $1 AND s.expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn delete_session(&self, token_hash: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM gc_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
