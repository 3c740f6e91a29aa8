//! Transport Message Envelope
//!
//! Every frame on the presence transport is one JSON envelope:
//! `{type, userId?, data?, timestamp?}`. The payload under `data` varies by
//! type; payload structs live here next to the envelope so both halves of
//! the transport agree on the wire form.
//!
//! # Unknown Types
//!
//! `MessageType` carries a catch-all `Unknown` variant (`#[serde(other)]`),
//! so a frame with an unrecognized type still decodes and can be logged and
//! ignored by the router. Only a structurally malformed frame is a decode
//! error.
//!
//! # Originator Stamping
//!
//! Echo suppression relies on `userId` always being the true originator on
//! broadcast frames. The server stamps it from the join identity via
//! [`Envelope::stamp`]; client-claimed values are overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::presence::{CollaborationUser, CursorPosition};

/// Discriminant of a transport frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Client -> server: enter a document session
    JoinDocument,
    /// Server -> client: the socket is registered
    ConnectionEstablished,
    /// Server -> client: authoritative presence snapshot
    DocumentUsers,
    /// A collaborator joined the document
    UserJoined,
    /// A collaborator left the document
    UserLeft,
    /// An annotation was created
    AnnotationCreated,
    /// An annotation was updated
    AnnotationUpdated,
    /// An annotation was deleted
    AnnotationDeleted,
    /// A collaborator moved their cursor
    CursorMove,
    /// A collaborator started or stopped typing
    UserTyping,
    /// Server -> client: a non-fatal error notice
    Error,
    /// Any type this build doesn't recognize
    #[serde(other)]
    Unknown,
}

/// One frame on the presence transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Frame discriminant
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Originating user, attached by the server on broadcast frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Type-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Server send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Payload of `join_document`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDocumentData {
    /// Canonical document id to join
    pub document_id: String,
    /// Joining user's account id
    pub user_id: String,
}

/// Payload of `document_users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUsersData {
    /// The other collaborators currently on the document
    pub users: Vec<CollaborationUser>,
}

/// Payload of `user_joined`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedData {
    /// The joining user's transport connection id
    pub connection_id: String,
}

/// Payload of `user_typing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    /// Whether the user is typing
    pub is_typing: bool,
    /// Where they're typing (e.g. "chat", an annotation id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Payload of `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    /// What went wrong
    pub message: String,
}

impl Envelope {
    /// Create an envelope with a raw payload
    pub fn new(message_type: MessageType, data: Option<serde_json::Value>) -> Self {
        Self {
            message_type,
            user_id: None,
            data,
            timestamp: None,
        }
    }

    /// Client -> server join request
    pub fn join_document(document_id: &str, user_id: &str) -> Self {
        Self::new(
            MessageType::JoinDocument,
            serde_json::to_value(JoinDocumentData {
                document_id: document_id.to_string(),
                user_id: user_id.to_string(),
            })
            .ok(),
        )
    }

    /// Annotation lifecycle frame; `payload` is the annotation itself
    pub fn annotation(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self::new(message_type, Some(payload))
    }

    /// Cursor movement frame
    pub fn cursor_move(position: CursorPosition) -> Self {
        Self::new(MessageType::CursorMove, serde_json::to_value(position).ok())
    }

    /// Typing indicator frame
    pub fn user_typing(is_typing: bool, location: Option<String>) -> Self {
        Self::new(
            MessageType::UserTyping,
            serde_json::to_value(TypingData { is_typing, location }).ok(),
        )
    }

    /// Server -> client registration acknowledgement
    pub fn connection_established() -> Self {
        Self::new(MessageType::ConnectionEstablished, None)
    }

    /// Server -> client presence snapshot
    pub fn document_users(users: Vec<CollaborationUser>) -> Self {
        Self::new(
            MessageType::DocumentUsers,
            serde_json::to_value(DocumentUsersData { users }).ok(),
        )
    }

    /// Broadcast: a user joined
    pub fn user_joined(user_id: &str, connection_id: &str) -> Self {
        let mut env = Self::new(
            MessageType::UserJoined,
            serde_json::to_value(UserJoinedData {
                connection_id: connection_id.to_string(),
            })
            .ok(),
        );
        env.user_id = Some(user_id.to_string());
        env
    }

    /// Broadcast: a user left
    pub fn user_left(user_id: &str) -> Self {
        let mut env = Self::new(MessageType::UserLeft, None);
        env.user_id = Some(user_id.to_string());
        env
    }

    /// Server -> client error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(
            MessageType::Error,
            serde_json::to_value(ErrorData {
                message: message.into(),
            })
            .ok(),
        )
    }

    /// Stamp the true originator and the server send time onto this frame
    ///
    /// Overwrites whatever the client claimed; this is the wire guarantee
    /// client-side echo suppression depends on.
    pub fn stamp(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self.timestamp = Some(Utc::now());
        self
    }

    /// Encode to a JSON string
    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON string
    pub fn decode(raw: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parse the payload as a specific type
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, SharedError> {
        let value = self.data.clone().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}
