//! Inbound Event Router
//!
//! Dispatches every frame the presence connection receives: presence
//! events update the local [`PresenceRegistry`], annotation events invoke
//! the application's callbacks, and everything self-originated is
//! discarded.
//!
//! # Echo Suppression
//!
//! The room fan-out includes the originator's own socket, so every frame
//! carrying a userId equal to the local userId is dropped here — a sender
//! must never reprocess its own echoed events. Suppression is keyed on the
//! account-level userId: two sessions of the same account do not re-apply
//! each other's annotations either.
//!
//! Callbacks run on the connection's read loop and must not block.

use crate::client::registry::PresenceRegistry;
use crate::shared::envelope::{DocumentUsersData, ErrorData, TypingData, UserJoinedData};
use crate::shared::presence::{CollaborationUser, CursorPosition};
use crate::shared::{Envelope, MessageType};

/// Callback invoked with a remote annotation event's payload
pub type AnnotationCallback = Box<dyn Fn(serde_json::Value) + Send + Sync>;
/// Callback invoked with a server error notice
pub type ErrorCallback = Box<dyn Fn(String) + Send + Sync>;

/// Routes inbound envelopes to the registry and application callbacks
pub struct EventRouter {
    local_user_id: String,
    registry: PresenceRegistry,
    on_annotation_created: Option<AnnotationCallback>,
    on_annotation_updated: Option<AnnotationCallback>,
    on_annotation_deleted: Option<AnnotationCallback>,
    on_error: Option<ErrorCallback>,
}

impl EventRouter {
    /// Create a router for the given local user
    pub fn new(local_user_id: impl Into<String>) -> Self {
        Self {
            local_user_id: local_user_id.into(),
            registry: PresenceRegistry::new(),
            on_annotation_created: None,
            on_annotation_updated: None,
            on_annotation_deleted: None,
            on_error: None,
        }
    }

    /// Set the annotation-created callback
    pub fn on_annotation_created(
        mut self,
        callback: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_annotation_created = Some(Box::new(callback));
        self
    }

    /// Set the annotation-updated callback
    pub fn on_annotation_updated(
        mut self,
        callback: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_annotation_updated = Some(Box::new(callback));
        self
    }

    /// Set the annotation-deleted callback
    pub fn on_annotation_deleted(
        mut self,
        callback: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_annotation_deleted = Some(Box::new(callback));
        self
    }

    /// Set the error callback
    pub fn on_error(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// The registry this router maintains
    pub fn registry(&self) -> PresenceRegistry {
        self.registry.clone()
    }

    /// The local user's id
    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }

    /// Whether a frame originated from this client's own account
    fn is_echo(&self, envelope: &Envelope) -> bool {
        envelope.user_id.as_deref() == Some(self.local_user_id.as_str())
    }

    /// Route one inbound envelope
    pub fn dispatch(&self, envelope: Envelope) {
        match envelope.message_type {
            MessageType::ConnectionEstablished => {
                tracing::info!("[Presence] Connection established");
            }

            MessageType::DocumentUsers => match envelope.data_as::<DocumentUsersData>() {
                Ok(data) => {
                    tracing::debug!("[Presence] Snapshot: {} collaborators", data.users.len());
                    self.registry.replace_all(data.users);
                }
                Err(err) => tracing::warn!("[Presence] Bad document_users payload: {err}"),
            },

            MessageType::UserJoined => {
                if self.is_echo(&envelope) {
                    return;
                }
                let Some(user_id) = envelope.user_id.clone() else {
                    tracing::warn!("[Presence] user_joined without userId");
                    return;
                };
                match envelope.data_as::<UserJoinedData>() {
                    Ok(data) => {
                        self.registry
                            .insert(CollaborationUser::new(data.connection_id, user_id));
                    }
                    Err(err) => tracing::warn!("[Presence] Bad user_joined payload: {err}"),
                }
            }

            MessageType::UserLeft => {
                if self.is_echo(&envelope) {
                    return;
                }
                if let Some(user_id) = envelope.user_id.as_deref() {
                    self.registry.remove(user_id);
                }
            }

            MessageType::AnnotationCreated => {
                self.invoke_annotation(&envelope, &self.on_annotation_created)
            }
            MessageType::AnnotationUpdated => {
                self.invoke_annotation(&envelope, &self.on_annotation_updated)
            }
            MessageType::AnnotationDeleted => {
                self.invoke_annotation(&envelope, &self.on_annotation_deleted)
            }

            MessageType::CursorMove => {
                if self.is_echo(&envelope) {
                    return;
                }
                let Some(user_id) = envelope.user_id.as_deref() else {
                    return;
                };
                match envelope.data_as::<CursorPosition>() {
                    Ok(position) => self.registry.update_cursor(user_id, position),
                    Err(err) => tracing::warn!("[Presence] Bad cursor_move payload: {err}"),
                }
            }

            MessageType::UserTyping => {
                if self.is_echo(&envelope) {
                    return;
                }
                let Some(user_id) = envelope.user_id.as_deref() else {
                    return;
                };
                match envelope.data_as::<TypingData>() {
                    Ok(typing) => self.registry.set_typing(user_id, typing.is_typing),
                    Err(err) => tracing::warn!("[Presence] Bad user_typing payload: {err}"),
                }
            }

            MessageType::Error => {
                let message = envelope
                    .data_as::<ErrorData>()
                    .map(|data| data.message)
                    .unwrap_or_else(|_| "unknown server error".to_string());
                tracing::warn!("[Presence] Server error: {message}");
                if let Some(callback) = &self.on_error {
                    callback(message);
                }
            }

            MessageType::JoinDocument => {
                tracing::debug!("[Presence] Ignoring server-bound join_document");
            }

            MessageType::Unknown => {
                tracing::warn!("[Presence] Ignoring unknown message type");
            }
        }
    }

    fn invoke_annotation(&self, envelope: &Envelope, callback: &Option<AnnotationCallback>) {
        if self.is_echo(envelope) {
            return;
        }
        if let Some(callback) = callback {
            callback(envelope.data.clone().unwrap_or(serde_json::Value::Null));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn annotation_event(user_id: &str) -> Envelope {
        Envelope::annotation(
            MessageType::AnnotationCreated,
            serde_json::json!({"id": "ann1"}),
        )
        .stamp(user_id)
    }

    #[test]
    fn test_own_annotation_events_are_suppressed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = EventRouter::new("u1")
            .on_annotation_created(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        router.dispatch(annotation_event("u1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        router.dispatch(annotation_event("u2"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_suppression_covers_every_user_bearing_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (c1, c2, c3) = (calls.clone(), calls.clone(), calls.clone());
        let router = EventRouter::new("u1")
            .on_annotation_created(move |_| {
                c1.fetch_add(1, Ordering::SeqCst);
            })
            .on_annotation_updated(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
            })
            .on_annotation_deleted(move |_| {
                c3.fetch_add(1, Ordering::SeqCst);
            });
        let registry = router.registry();

        for message_type in [
            MessageType::AnnotationCreated,
            MessageType::AnnotationUpdated,
            MessageType::AnnotationDeleted,
        ] {
            router.dispatch(
                Envelope::annotation(message_type, serde_json::json!({})).stamp("u1"),
            );
        }
        router.dispatch(Envelope::user_joined("u1", "c9").stamp("u1"));
        router.dispatch(Envelope::cursor_move(CursorPosition { page: 1, x: 0.0, y: 0.0 }).stamp("u1"));
        router.dispatch(Envelope::user_typing(true, None).stamp("u1"));
        router.dispatch(Envelope::user_left("u1").stamp("u1"));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remote_join_and_leave_update_registry() {
        let router = EventRouter::new("u1");
        let registry = router.registry();

        router.dispatch(Envelope::user_joined("u2", "c2").stamp("u2"));
        assert_eq!(registry.len(), 1);

        router.dispatch(Envelope::user_left("u2").stamp("u2"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_document_users_replaces_wholesale() {
        let router = EventRouter::new("u1");
        let registry = router.registry();
        router.dispatch(Envelope::user_joined("u2", "c2").stamp("u2"));

        router.dispatch(Envelope::document_users(vec![
            CollaborationUser::new("c3", "u3"),
            CollaborationUser::new("c4", "u4"),
        ]));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("u2").is_none());
    }

    #[test]
    fn test_remote_cursor_and_typing_update_registry() {
        let router = EventRouter::new("u1");
        let registry = router.registry();
        router.dispatch(Envelope::user_joined("u2", "c2").stamp("u2"));

        router.dispatch(
            Envelope::cursor_move(CursorPosition { page: 7, x: 0.2, y: 0.4 }).stamp("u2"),
        );
        router.dispatch(Envelope::user_typing(true, None).stamp("u2"));

        let user = registry.get("u2").unwrap();
        assert_eq!(user.cursor.unwrap().page, 7);
        assert_eq!(user.is_typing, Some(true));
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let router = EventRouter::new("u1");
        let envelope = Envelope::decode(r#"{"type":"galaxy_brain","userId":"u2"}"#).unwrap();
        // Must not panic or touch state
        router.dispatch(envelope);
        assert!(router.registry().is_empty());
    }

    #[test]
    fn test_error_event_reaches_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = EventRouter::new("u1").on_error(move |message| {
            assert_eq!(message, "room full");
            counter.fetch_add(1, Ordering::SeqCst);
        });
        router.dispatch(Envelope::error("room full"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_events_without_user_id_are_not_suppressed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = EventRouter::new("u1").on_annotation_created(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        // No userId at all: nothing to suppress on
        router.dispatch(Envelope::annotation(
            MessageType::AnnotationCreated,
            serde_json::json!({"id": "ann1"}),
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
