//! Chat Message Types
//!
//! The chat log is the adjunct channel next to the presence transport:
//! append-only, ordered by server-assigned timestamp, polled with a
//! since-cursor. These types are shared by the backend storage layer and the
//! polling client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message in a session's chat log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message id
    pub id: String,
    /// Chat session (usually the document id)
    pub session_id: String,
    /// Author's account id (resolved server-side)
    pub user_id: String,
    /// Author's display name (resolved server-side, never from the payload)
    pub user_name: String,
    /// Message body
    pub message: String,
    /// Message kind ("text" unless the client says otherwise)
    pub message_type: String,
    /// Free-form client metadata, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Server-assigned timestamp; monotonic per session
    pub created_at: DateTime<Utc>,
}
