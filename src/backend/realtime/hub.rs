/**
 * Presence Hub
 *
 * Server-side presence bookkeeping: one room per document, each room
 * holding the collaborators currently on it plus a broadcast channel for
 * fan-out. Rooms are created on first join and dropped once the last
 * collaborator and subscriber are gone.
 *
 * # Invariants
 *
 * - At most one `CollaborationUser` per (document, userId): a second join
 *   for the same user replaces the first.
 * - A leave only removes the entry if the departing connection still owns
 *   it, so a replaced session's teardown cannot evict its successor.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::shared::presence::{CollaborationUser, CursorPosition};
use crate::shared::Envelope;

/// Broadcast capacity per room; a slow consumer past this lags and drops
const ROOM_CHANNEL_CAPACITY: usize = 256;

struct Room {
    users: HashMap<String, CollaborationUser>,
    sender: broadcast::Sender<Envelope>,
}

impl Room {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self {
            users: HashMap::new(),
            sender,
        }
    }
}

/// Per-document presence rooms with broadcast fan-out
///
/// Cheaply cloneable; all clones share the same rooms.
#[derive(Clone)]
pub struct PresenceHub {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
}

impl PresenceHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a user on a document's room
    ///
    /// Returns the room's broadcast receiver and a snapshot of the *other*
    /// collaborators already present (for the `document_users` frame).
    /// A join for an already-present userId replaces the previous entry.
    pub fn join(
        &self,
        document_id: &str,
        user: CollaborationUser,
    ) -> (broadcast::Receiver<Envelope>, Vec<CollaborationUser>) {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.entry(document_id.to_string()).or_insert_with(Room::new);

        let others: Vec<CollaborationUser> = room
            .users
            .values()
            .filter(|u| u.user_id != user.user_id)
            .cloned()
            .collect();

        room.users.insert(user.user_id.clone(), user);
        (room.sender.subscribe(), others)
    }

    /// Remove a user from a room, if `connection_id` still owns the entry
    ///
    /// Returns whether an entry was actually removed.
    pub fn leave(&self, document_id: &str, user_id: &str, connection_id: &str) -> bool {
        let mut rooms = self.rooms.lock().unwrap();
        let Some(room) = rooms.get_mut(document_id) else {
            return false;
        };

        let owned = room
            .users
            .get(user_id)
            .is_some_and(|u| u.connection_id == connection_id);
        if owned {
            room.users.remove(user_id);
        }

        if room.users.is_empty() && room.sender.receiver_count() == 0 {
            rooms.remove(document_id);
        }
        owned
    }

    /// Update a present user's cursor
    pub fn update_cursor(&self, document_id: &str, user_id: &str, cursor: CursorPosition) {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(user) = rooms
            .get_mut(document_id)
            .and_then(|room| room.users.get_mut(user_id))
        {
            user.cursor = Some(cursor);
        }
    }

    /// Update a present user's typing flag
    pub fn set_typing(&self, document_id: &str, user_id: &str, is_typing: bool) {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(user) = rooms
            .get_mut(document_id)
            .and_then(|room| room.users.get_mut(user_id))
        {
            user.is_typing = Some(is_typing);
        }
    }

    /// Broadcast an envelope to everyone subscribed to a room
    ///
    /// Returns the number of subscribers that received it (0 when the room
    /// doesn't exist or nobody is listening).
    pub fn broadcast(&self, document_id: &str, envelope: Envelope) -> usize {
        let rooms = self.rooms.lock().unwrap();
        let Some(room) = rooms.get(document_id) else {
            return 0;
        };
        match room.sender.send(envelope) {
            Ok(count) => count,
            Err(_) => {
                // No subscribers, that's okay
                tracing::debug!("[Presence] No subscribers on {}", document_id);
                0
            }
        }
    }

    /// Snapshot of everyone present on a document
    pub fn users(&self, document_id: &str) -> Vec<CollaborationUser> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(document_id)
            .map(|room| room.users.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of users present on a document
    pub fn user_count(&self, document_id: &str) -> usize {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(document_id).map(|room| room.users.len()).unwrap_or(0)
    }
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::new()
    }
}
