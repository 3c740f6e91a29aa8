//! Client-Side Presence Registry
//!
//! The local replica of "who else is on this document": at most one
//! `CollaborationUser` per userId, replaced wholesale by `document_users`
//! snapshots and patched incrementally by join/leave/cursor/typing events.
//! Cleared on disconnect; the next snapshot after a reconnect is the
//! authoritative resync point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::shared::presence::{CollaborationUser, CursorPosition};

/// Collaborators present on the current document
///
/// Cheaply cloneable; all clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    users: Arc<Mutex<HashMap<String, CollaborationUser>>>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole registry with a server snapshot
    pub fn replace_all(&self, users: Vec<CollaborationUser>) {
        let mut map = self.users.lock().unwrap();
        map.clear();
        for user in users {
            map.insert(user.user_id.clone(), user);
        }
    }

    /// Insert one collaborator; a second entry for the same userId replaces
    /// the first
    pub fn insert(&self, user: CollaborationUser) {
        self.users.lock().unwrap().insert(user.user_id.clone(), user);
    }

    /// Remove one collaborator; returns whether they were present
    pub fn remove(&self, user_id: &str) -> bool {
        self.users.lock().unwrap().remove(user_id).is_some()
    }

    /// Update a collaborator's cursor; ignored when they're not present
    pub fn update_cursor(&self, user_id: &str, cursor: CursorPosition) {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.cursor = Some(cursor);
        }
    }

    /// Update a collaborator's typing flag; ignored when they're not present
    pub fn set_typing(&self, user_id: &str, is_typing: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.is_typing = Some(is_typing);
        }
    }

    /// Look up one collaborator
    pub fn get(&self, user_id: &str) -> Option<CollaborationUser> {
        self.users.lock().unwrap().get(user_id).cloned()
    }

    /// Snapshot of everyone present
    pub fn users(&self) -> Vec<CollaborationUser> {
        self.users.lock().unwrap().values().cloned().collect()
    }

    /// Number of collaborators present
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Whether nobody is present
    pub fn is_empty(&self) -> bool {
        self.users.lock().unwrap().is_empty()
    }

    /// Drop everyone (called on disconnect)
    pub fn clear(&self) {
        self.users.lock().unwrap().clear();
    }
}
