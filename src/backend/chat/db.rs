/**
 * Database Operations for Chat Messages
 *
 * This module provides the storage layer for the chat log: append with
 * server-assigned id and timestamp, paged and since-cursor reads, and
 * owner-predicated deletion.
 *
 * # Ordering
 *
 * `created_at` is monotonic per session: an insert that would collide with
 * or precede the session's latest timestamp is bumped just past it, so
 * since-cursor polling never misses or repeats a message.
 *
 * # Ownership
 *
 * Deletion runs `DELETE ... WHERE id = ? AND user_id = ?` so ownership is
 * enforced by the storage layer itself; the affected-row count then
 * distinguishes "not yours" from "not there".
 */

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::ChatMessage;

/// Result of an owner-predicated delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The row existed, belonged to the requester, and is gone
    Deleted,
    /// The row exists but belongs to someone else; nothing was deleted
    NotOwner,
    /// No such row
    NotFound,
}

/// Run the chat schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    session_id: String,
    user_id: String,
    user_name: String,
    message: String,
    message_type: String,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            session_id: row.session_id,
            user_id: row.user_id,
            user_name: row.user_name,
            message: row.message,
            message_type: row.message_type,
            metadata: row
                .metadata
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            created_at: row.created_at,
        }
    }
}

/// Append a message with a server-assigned id and timestamp
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `session_id` - Chat session the message belongs to
/// * `user_id` / `user_name` - The authenticated author (resolved by the
///   gateway, never taken from the payload)
/// * `message` - Message body
/// * `message_type` - Message kind
/// * `metadata` - Free-form client metadata
pub async fn insert_message(
    pool: &SqlitePool,
    session_id: &str,
    user_id: &str,
    user_name: &str,
    message: &str,
    message_type: &str,
    metadata: Option<&serde_json::Value>,
) -> Result<ChatMessage, sqlx::Error> {
    let last: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT MAX(created_at) FROM chat_messages WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    // Keep created_at strictly increasing within the session.
    let mut created_at = Utc::now();
    if let Some(last) = last {
        if created_at <= last {
            created_at = last + Duration::microseconds(1);
        }
    }

    let chat_message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        message: message.to_string(),
        message_type: message_type.to_string(),
        metadata: metadata.cloned(),
        created_at,
    };

    sqlx::query(
        r#"
        INSERT INTO chat_messages
            (id, session_id, user_id, user_name, message, message_type, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&chat_message.id)
    .bind(&chat_message.session_id)
    .bind(&chat_message.user_id)
    .bind(&chat_message.user_name)
    .bind(&chat_message.message)
    .bind(&chat_message.message_type)
    .bind(
        chat_message
            .metadata
            .as_ref()
            .map(|m| m.to_string()),
    )
    .bind(chat_message.created_at)
    .execute(pool)
    .await?;

    Ok(chat_message)
}

/// Load one page of a session's messages, ascending by `created_at`
///
/// The query walks backwards from the newest message (page 1 is the most
/// recent page), but the returned vector is always ascending.
pub async fn list_messages_page(
    pool: &SqlitePool,
    session_id: &str,
    page: u32,
    limit: u32,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let offset = (page.saturating_sub(1) as i64) * limit as i64;
    let mut rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, session_id, user_id, user_name, message, message_type, metadata, created_at
        FROM chat_messages
        WHERE session_id = ?
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(session_id)
    .bind(limit as i64)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows.into_iter().map(ChatMessage::from).collect())
}

/// Load every message of a session strictly newer than `since`, ascending
pub async fn list_messages_since(
    pool: &SqlitePool,
    session_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, session_id, user_id, user_name, message, message_type, metadata, created_at
        FROM chat_messages
        WHERE session_id = ? AND created_at > ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(session_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ChatMessage::from).collect())
}

/// Count a session's messages
pub async fn count_messages(pool: &SqlitePool, session_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await
}

/// Delete a message if and only if `user_id` is its author
pub async fn delete_message_as(
    pool: &SqlitePool,
    message_id: &str,
    user_id: &str,
) -> Result<DeleteOutcome, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chat_messages WHERE id = ? AND user_id = ?")
        .bind(message_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(DeleteOutcome::Deleted);
    }

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE id = ?")
        .bind(message_id)
        .fetch_one(pool)
        .await?;

    if exists > 0 {
        Ok(DeleteOutcome::NotOwner)
    } else {
        Ok(DeleteOutcome::NotFound)
    }
}
