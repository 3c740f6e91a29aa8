//! Presence Connection
//!
//! WebSocket client for the presence transport. Connection lifecycle is an
//! explicit state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                     ^            |
//!                     |       close/error
//!                 (timer up)       v
//!                     +------- Backoff{attempt} --(cap hit)--> Failed
//! ```
//!
//! A single supervisor task owns the machine. Transport reads, writes, and
//! the reconnect timer all live inside its `select!` loops, so
//! `disconnect()` cancels a pending timer by dropping it — there is no
//! detached timer that could race a deliberate shutdown.
//!
//! Connection errors are non-fatal and retried with exponential backoff up
//! to a 5-attempt cap; after that the state is `Failed`, a persistent
//! error string is surfaced, and the caller must call `connect()` again.
//! Malformed inbound frames are logged and dropped, never crash the
//! connection.

use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::client::router::EventRouter;
use crate::shared::presence::CursorPosition;
use crate::shared::{Envelope, MessageType, SharedError, UniversalAnnotation};

/// Reconnect attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Backoff ceiling
const MAX_BACKOFF: Duration = Duration::from_millis(30_000);

/// Outbound queue depth per session
const OUTGOING_CAPACITY: usize = 256;

/// Reconnect delay for the given attempt: `min(1000 * 2^attempt, 30000)` ms
pub fn backoff_delay(attempt: u32) -> Duration {
    let millis = 1000u64 << attempt.min(15);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Connection lifecycle states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, no pending reconnect
    Disconnected,
    /// Transport handshake in flight
    Connecting,
    /// Transport open, `join_document` sent
    Connected,
    /// Waiting out the reconnect delay for this attempt
    Backoff {
        /// Zero-based reconnect attempt about to be made
        attempt: u32,
    },
    /// Reconnect cap exhausted; `connect()` must be called explicitly
    Failed,
}

/// Connection parameters
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// WebSocket endpoint, e.g. `ws://host:3000/ws`
    pub url: String,
    /// Canonical document id to join
    pub document_id: String,
    /// This client's account id
    pub user_id: String,
    /// Reconnect cap
    pub max_reconnect_attempts: u32,
}

impl PresenceConfig {
    /// Config with the default reconnect cap
    pub fn new(
        url: impl Into<String>,
        document_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            document_id: document_id.into(),
            user_id: user_id.into(),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

struct ClientInner {
    config: PresenceConfig,
    router: EventRouter,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    outgoing: Mutex<Option<mpsc::Sender<Envelope>>>,
    connection_error: Mutex<Option<String>>,
}

impl ClientInner {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    fn set_outgoing(&self, sender: Option<mpsc::Sender<Envelope>>) {
        *self.outgoing.lock().unwrap() = sender;
    }
}

/// The presence transport client
///
/// Cheaply cloneable; all clones drive the same connection.
#[derive(Clone)]
pub struct PresenceClient {
    inner: Arc<ClientInner>,
}

impl PresenceClient {
    /// Create a client; no transport is opened until [`connect`]
    ///
    /// [`connect`]: PresenceClient::connect
    pub fn new(config: PresenceConfig, router: EventRouter) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ClientInner {
                config,
                router,
                state_tx,
                shutdown_tx,
                outgoing: Mutex::new(None),
                connection_error: Mutex::new(None),
            }),
        }
    }

    /// Start the connection supervisor
    ///
    /// No-op when already connecting, connected, or waiting out a backoff.
    /// From `Failed` this is the explicit restart the state machine
    /// requires: the attempt counter and error string are reset.
    pub async fn connect(&self) {
        let current = self.inner.state_tx.borrow().clone();
        if !matches!(
            current,
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            tracing::debug!("[Presence] connect() ignored in state {:?}", current);
            return;
        }

        self.inner.shutdown_tx.send_replace(false);
        *self.inner.connection_error.lock().unwrap() = None;
        // Leave Disconnected/Failed before spawning so a racing second
        // connect() sees the supervisor as already running.
        self.inner.set_state(ConnectionState::Connecting);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            supervise(inner).await;
        });
    }

    /// Tear the connection down
    ///
    /// Cancels any pending reconnect timer, closes the transport if open,
    /// and clears the local presence registry. No auto-reconnect happens
    /// afterwards.
    pub fn disconnect(&self) {
        self.inner.shutdown_tx.send_replace(true);
        self.inner.set_outgoing(None);
        self.inner.router.registry().clear();
        // From Failed there is no supervisor left to observe the shutdown.
        if self.state() == ConnectionState::Failed {
            self.inner.set_state(ConnectionState::Disconnected);
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Watch lifecycle state changes
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// The persistent error surfaced once the reconnect cap is exhausted
    pub fn connection_error(&self) -> Option<String> {
        self.inner.connection_error.lock().unwrap().clone()
    }

    /// The router's presence registry
    pub fn registry(&self) -> crate::client::registry::PresenceRegistry {
        self.inner.router.registry()
    }

    /// Announce a locally created annotation
    pub async fn send_annotation_created(
        &self,
        annotation: &UniversalAnnotation,
    ) -> Result<(), SharedError> {
        self.send(Envelope::annotation(
            MessageType::AnnotationCreated,
            serde_json::to_value(annotation)?,
        ))
        .await
    }

    /// Announce a locally updated annotation
    pub async fn send_annotation_updated(
        &self,
        annotation: &UniversalAnnotation,
    ) -> Result<(), SharedError> {
        self.send(Envelope::annotation(
            MessageType::AnnotationUpdated,
            serde_json::to_value(annotation)?,
        ))
        .await
    }

    /// Announce a locally deleted annotation
    pub async fn send_annotation_deleted(&self, annotation_id: &str) -> Result<(), SharedError> {
        self.send(Envelope::annotation(
            MessageType::AnnotationDeleted,
            serde_json::json!({ "id": annotation_id }),
        ))
        .await
    }

    /// Report this client's cursor position
    pub async fn send_cursor_move(&self, position: CursorPosition) -> Result<(), SharedError> {
        self.send(Envelope::cursor_move(position)).await
    }

    /// Report this client's typing state
    pub async fn send_typing(
        &self,
        is_typing: bool,
        location: Option<String>,
    ) -> Result<(), SharedError> {
        self.send(Envelope::user_typing(is_typing, location)).await
    }

    async fn send(&self, envelope: Envelope) -> Result<(), SharedError> {
        let sender = self
            .inner
            .outgoing
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SharedError::transport("not connected"))?;
        sender
            .send(envelope)
            .await
            .map_err(|_| SharedError::transport("connection closed"))
    }
}

enum SessionEnd {
    /// Deliberate local shutdown
    Shutdown,
    /// The transport dropped out from under us
    ConnectionLost(String),
}

/// The supervisor: owns the whole state machine for one `connect()` call
async fn supervise(inner: Arc<ClientInner>) {
    let mut shutdown_rx = inner.shutdown_tx.subscribe();
    let mut attempt: u32 = 0;
    let mut last_error = String::from("never connected");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        inner.set_state(ConnectionState::Connecting);
        tracing::info!("[Presence] Connecting to {}", inner.config.url);

        match tokio_tungstenite::connect_async(inner.config.url.as_str()).await {
            Ok((ws, _)) => {
                attempt = 0;
                inner.set_state(ConnectionState::Connected);
                let end = run_session(&inner, ws, &mut shutdown_rx).await;
                inner.set_outgoing(None);
                match end {
                    SessionEnd::Shutdown => break,
                    SessionEnd::ConnectionLost(reason) => {
                        tracing::warn!("[Presence] Connection lost: {reason}");
                        last_error = reason;
                    }
                }
            }
            Err(err) => {
                tracing::warn!("[Presence] Connect failed: {err}");
                last_error = err.to_string();
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }

        if attempt >= inner.config.max_reconnect_attempts {
            tracing::error!(
                "[Presence] Giving up after {} reconnect attempts",
                inner.config.max_reconnect_attempts
            );
            *inner.connection_error.lock().unwrap() = Some(format!(
                "Connection failed after {} attempts: {last_error}",
                inner.config.max_reconnect_attempts
            ));
            inner.set_state(ConnectionState::Failed);
            return;
        }

        let delay = backoff_delay(attempt);
        inner.set_state(ConnectionState::Backoff { attempt });
        tracing::info!(
            "[Presence] Reconnecting in {}ms (attempt {} of {})",
            delay.as_millis(),
            attempt + 1,
            inner.config.max_reconnect_attempts
        );
        attempt += 1;

        // The timer lives inside this select: a shutdown drops it.
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    inner.set_state(ConnectionState::Disconnected);
    inner.router.registry().clear();
}

/// Drive one open transport until it drops or we shut down
async fn run_session(
    inner: &Arc<ClientInner>,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    let join = Envelope::join_document(&inner.config.document_id, &inner.config.user_id);
    match join.encode() {
        Ok(encoded) => {
            if sink.send(Message::Text(encoded.into())).await.is_err() {
                return SessionEnd::ConnectionLost("failed to send join_document".to_string());
            }
        }
        Err(err) => return SessionEnd::ConnectionLost(err.to_string()),
    }

    let (out_tx, mut out_rx) = mpsc::channel::<Envelope>(OUTGOING_CAPACITY);
    inner.set_outgoing(Some(out_tx));

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }
            outbound = out_rx.recv() => {
                // The sender only drops on disconnect(); treat it as one.
                let Some(envelope) = outbound else {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                };
                match envelope.encode() {
                    Ok(encoded) => {
                        if sink.send(Message::Text(encoded.into())).await.is_err() {
                            return SessionEnd::ConnectionLost("send failed".to_string());
                        }
                    }
                    Err(err) => {
                        tracing::warn!("[Presence] Failed to encode outbound frame: {err}");
                    }
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::decode(&text) {
                    Ok(envelope) => inner.router.dispatch(envelope),
                    Err(err) => {
                        tracing::warn!("[Presence] Dropping malformed frame: {err}");
                    }
                },
                Some(Ok(Message::Close(_))) => {
                    return SessionEnd::ConnectionLost("closed by server".to_string());
                }
                Some(Ok(_)) => {} // binary/ping/pong: ignored
                Some(Err(err)) => return SessionEnd::ConnectionLost(err.to_string()),
                None => return SessionEnd::ConnectionLost("stream ended".to_string()),
            }
        }
    }
}
