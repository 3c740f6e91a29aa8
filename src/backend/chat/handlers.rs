/**
 * Chat HTTP Handlers
 *
 * The chat log's HTTP surface:
 *
 * - `GET /api/chat/messages?session_id&(page&limit | since)` - read a page
 *   or poll with a since-cursor
 * - `POST /api/chat/messages` - append a message as the authenticated user
 * - `DELETE /api/chat/messages?message_id=` - author-only deletion
 *
 * The author identity always comes from the gateway headers; the payload
 * never names its own author.
 */

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::backend::chat::db;
use crate::backend::error::ApiError;
use crate::backend::identity::UserIdentity;
use crate::backend::server::state::AppState;
use crate::shared::{ApiResponse, ChatMessage};

const DEFAULT_PAGE_LIMIT: u32 = 50;
const MAX_PAGE_LIMIT: u32 = 200;

fn chat_pool(state: &AppState) -> Result<SqlitePool, ApiError> {
    state
        .db_pool
        .clone()
        .ok_or_else(|| ApiError::internal("Chat storage not configured"))
}

/// Query of `GET /api/chat/messages`
#[derive(Debug, Deserialize)]
pub struct ChatListQuery {
    session_id: String,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    /// Since-cursor; mutually exclusive with page/limit in practice, and it
    /// wins when both are present
    #[serde(default)]
    since: Option<DateTime<Utc>>,
}

/// Page info attached to paged listings
#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Response of `GET /api/chat/messages`
///
/// Same `{success, data}` shape as everything else, plus `pagination` for
/// paged reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub success: bool,
    pub data: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Handle `GET /api/chat/messages`
pub async fn list_chat_messages(
    State(state): State<AppState>,
    Query(query): Query<ChatListQuery>,
) -> Result<Json<ChatListResponse>, ApiError> {
    let pool = chat_pool(&state)?;
    if query.session_id.trim().is_empty() {
        return Err(ApiError::bad_request("session_id is required"));
    }

    if let Some(since) = query.since {
        let messages = db::list_messages_since(&pool, &query.session_id, since).await?;
        return Ok(Json(ChatListResponse {
            success: true,
            data: messages,
            pagination: None,
        }));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let messages = db::list_messages_page(&pool, &query.session_id, page, limit).await?;
    let total = db::count_messages(&pool, &query.session_id).await?;

    Ok(Json(ChatListResponse {
        success: true,
        data: messages,
        pagination: Some(Pagination { page, limit, total }),
    }))
}

/// Body of `POST /api/chat/messages`
#[derive(Debug, Deserialize)]
pub struct PostChatRequest {
    session_id: String,
    message: String,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Handle `POST /api/chat/messages`
pub async fn post_chat_message(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(body): Json<PostChatRequest>,
) -> Result<Json<ApiResponse<ChatMessage>>, ApiError> {
    let pool = chat_pool(&state)?;
    if body.session_id.trim().is_empty() {
        return Err(ApiError::bad_request("session_id is required"));
    }
    if body.message.trim().is_empty() {
        return Err(ApiError::bad_request("message cannot be empty"));
    }

    let message = db::insert_message(
        &pool,
        &body.session_id,
        &identity.user_id,
        &identity.user_name,
        &body.message,
        body.message_type.as_deref().unwrap_or("text"),
        body.metadata.as_ref(),
    )
    .await?;

    tracing::debug!(
        "[Chat] {} posted to session {}",
        identity.user_id,
        message.session_id
    );
    Ok(Json(ApiResponse::ok(message)))
}

/// Query of `DELETE /api/chat/messages`
#[derive(Debug, Deserialize)]
pub struct DeleteChatQuery {
    message_id: String,
}

/// Handle `DELETE /api/chat/messages`
///
/// Only the author may delete; a non-author gets an explicit 403 and the
/// row stays.
pub async fn delete_chat_message(
    State(state): State<AppState>,
    identity: UserIdentity,
    Query(query): Query<DeleteChatQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let pool = chat_pool(&state)?;

    match db::delete_message_as(&pool, &query.message_id, &identity.user_id).await? {
        db::DeleteOutcome::Deleted => Ok(Json(ApiResponse {
            success: true,
            message: Some("Message deleted".to_string()),
            data: None,
        })),
        db::DeleteOutcome::NotOwner => {
            Err(ApiError::forbidden("You can only delete your own messages"))
        }
        db::DeleteOutcome::NotFound => Err(ApiError::not_found("Message not found")),
    }
}
