//! Presence Types
//!
//! A collaborator "present" on a document is a user with an open transport
//! connection plus their ephemeral, never-persisted state: cursor position
//! and typing flag. These types travel in `document_users` snapshots and
//! `user_joined` / `cursor_move` / `user_typing` events.

use serde::{Deserialize, Serialize};

/// Cursor location within a document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    /// 1-based page number
    pub page: u32,
    /// Horizontal offset within the page, 0.0..=1.0
    pub x: f64,
    /// Vertical offset within the page, 0.0..=1.0
    pub y: f64,
}

/// A user currently present on a shared document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationUser {
    /// Transport connection id (unique per open socket)
    pub connection_id: String,
    /// Account-level user id
    pub user_id: String,
    /// Last reported cursor position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    /// Whether the user is currently typing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_typing: Option<bool>,
}

impl CollaborationUser {
    /// Create a freshly joined user with no ephemeral state yet
    pub fn new(connection_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            user_id: user_id.into(),
            cursor: None,
            is_typing: None,
        }
    }
}
