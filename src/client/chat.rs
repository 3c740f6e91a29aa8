//! Since-Cursor Chat Polling
//!
//! Pull-based retrieval for the chat log: each poll asks only for messages
//! strictly newer than the last observed timestamp, so a client never
//! re-processes a message it has already seen. The server's monotonic
//! per-session timestamps make the cursor safe to advance to the newest
//! message of every batch.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::shared::{ChatMessage, SharedError};

/// Response shape of the chat listing endpoint
#[derive(Debug, Deserialize)]
struct ChatListBody {
    success: bool,
    #[serde(default)]
    data: Vec<ChatMessage>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for one chat session
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
    user_id: String,
    user_name: String,
    last_seen: Option<DateTime<Utc>>,
}

impl ChatClient {
    /// Create a poller for a session
    ///
    /// `user_id`/`user_name` are sent as the gateway identity headers; in a
    /// deployed setup the identity provider in front of the server
    /// overwrites them.
    pub fn new(
        base_url: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            last_seen: None,
        }
    }

    /// The current since-cursor
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Forget the cursor; the next poll fetches the newest page again
    pub fn reset_cursor(&mut self) {
        self.last_seen = None;
    }

    /// Fetch messages newer than the cursor and advance it
    pub async fn poll(&mut self) -> Result<Vec<ChatMessage>, SharedError> {
        let mut request = self
            .http
            .get(format!("{}/api/chat/messages", self.base_url))
            .query(&[("session_id", self.session_id.as_str())]);
        if let Some(since) = self.last_seen {
            request = request.query(&[("since", since.to_rfc3339())]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SharedError::transport(err.to_string()))?;
        let body: ChatListBody = response
            .json()
            .await
            .map_err(|err| SharedError::transport(err.to_string()))?;

        if !body.success {
            return Err(SharedError::transport(
                body.message.unwrap_or_else(|| "chat poll failed".to_string()),
            ));
        }

        self.advance_cursor(&body.data);
        Ok(body.data)
    }

    /// Post a message to the session
    pub async fn post(&self, message: &str) -> Result<ChatMessage, SharedError> {
        #[derive(Debug, Deserialize)]
        struct PostBody {
            success: bool,
            #[serde(default)]
            data: Option<ChatMessage>,
            #[serde(default)]
            message: Option<String>,
        }

        let response = self
            .http
            .post(format!("{}/api/chat/messages", self.base_url))
            .header("x-user-id", &self.user_id)
            .header("x-user-name", &self.user_name)
            .json(&serde_json::json!({
                "session_id": self.session_id,
                "message": message,
            }))
            .send()
            .await
            .map_err(|err| SharedError::transport(err.to_string()))?;

        let body: PostBody = response
            .json()
            .await
            .map_err(|err| SharedError::transport(err.to_string()))?;
        match (body.success, body.data) {
            (true, Some(message)) => Ok(message),
            _ => Err(SharedError::transport(
                body.message.unwrap_or_else(|| "chat post failed".to_string()),
            )),
        }
    }

    /// Move the cursor past every message in a batch
    fn advance_cursor(&mut self, messages: &[ChatMessage]) {
        let newest = messages.iter().map(|m| m.created_at).max();
        if let Some(newest) = newest {
            if self.last_seen.is_none_or(|seen| newest > seen) {
                self.last_seen = Some(newest);
            }
        }
    }
}
