/**
 * Presence WebSocket Handler
 *
 * One task per socket. The first frame must be `join_document`; the server
 * then registers the connection in the presence hub, answers with
 * `connection_established` and a `document_users` snapshot of the other
 * collaborators, and announces `user_joined` to the room.
 *
 * # Originator Stamping
 *
 * Every relayed frame is re-stamped with the join identity's userId and a
 * server timestamp before fan-out, regardless of what the payload claims.
 * Client-side echo suppression depends on this: the fan-out includes the
 * originator's own socket, and the client discards frames whose userId
 * matches its own.
 *
 * # Failure Handling
 *
 * Malformed frames are logged and dropped; the connection stays up. Close
 * or a transport error tears the user down (if the connection still owns
 * the presence entry) and announces `user_left`.
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::realtime::hub::PresenceHub;
use crate::backend::server::state::AppState;
use crate::shared::envelope::{JoinDocumentData, TypingData};
use crate::shared::presence::{CollaborationUser, CursorPosition};
use crate::shared::{Envelope, MessageType};

/// Handle `GET /ws` (WebSocket upgrade)
pub async fn handle_presence_socket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.presence_hub.clone();
    ws.on_upgrade(move |socket| presence_session(socket, hub))
}

/// Drive one presence connection from upgrade to teardown
async fn presence_session(socket: WebSocket, hub: PresenceHub) {
    let (mut sink, mut stream) = socket.split();

    let Some(join) = await_join(&mut sink, &mut stream).await else {
        return;
    };

    let connection_id = Uuid::new_v4().to_string();
    let (mut room_rx, others) =
        hub.join(&join.document_id, CollaborationUser::new(&connection_id, &join.user_id));

    tracing::info!(
        "[Presence] {} joined {} ({} present)",
        join.user_id,
        join.document_id,
        hub.user_count(&join.document_id)
    );

    let established = send_envelope(&mut sink, Envelope::connection_established()).await
        && send_envelope(&mut sink, Envelope::document_users(others)).await;
    if established {
        hub.broadcast(
            &join.document_id,
            Envelope::user_joined(&join.user_id, &connection_id).stamp(&join.user_id),
        );

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(relay) = handle_inbound(&hub, &join, &text) {
                            hub.broadcast(&join.document_id, relay);
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong: ignored
                },
                outbound = room_rx.recv() => match outbound {
                    Ok(envelope) => {
                        if !send_envelope(&mut sink, envelope).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Presence] {} lagged, {} events dropped",
                            join.user_id,
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    if hub.leave(&join.document_id, &join.user_id, &connection_id) {
        hub.broadcast(
            &join.document_id,
            Envelope::user_left(&join.user_id).stamp(&join.user_id),
        );
        tracing::info!("[Presence] {} left {}", join.user_id, join.document_id);
    }
}

/// Wait for a valid `join_document` frame; anything else is logged and
/// dropped. Returns None when the socket closes first.
async fn await_join(
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
) -> Option<JoinDocumentData> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match Envelope::decode(&text) {
                Ok(envelope) if envelope.message_type == MessageType::JoinDocument => {
                    match envelope.data_as::<JoinDocumentData>() {
                        Ok(join)
                            if !join.document_id.trim().is_empty()
                                && !join.user_id.trim().is_empty() =>
                        {
                            return Some(join);
                        }
                        _ => {
                            let _ = send_envelope(
                                sink,
                                Envelope::error("join_document requires documentId and userId"),
                            )
                            .await;
                        }
                    }
                }
                Ok(envelope) => {
                    tracing::warn!(
                        "[Presence] Expected join_document, got {:?}",
                        envelope.message_type
                    );
                }
                Err(err) => {
                    tracing::warn!("[Presence] Dropping malformed frame: {err}");
                }
            },
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(_)) => {}
        }
    }
}

/// Decode an inbound frame and decide what (if anything) to relay
///
/// Cursor and typing frames also update the hub's presence state so later
/// `document_users` snapshots carry the latest ephemeral fields.
fn handle_inbound(hub: &PresenceHub, join: &JoinDocumentData, text: &str) -> Option<Envelope> {
    let envelope = match Envelope::decode(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!("[Presence] Dropping malformed frame: {err}");
            return None;
        }
    };

    match envelope.message_type {
        MessageType::CursorMove => {
            let position: CursorPosition = match envelope.data_as() {
                Ok(position) => position,
                Err(err) => {
                    tracing::warn!("[Presence] Dropping cursor_move with bad payload: {err}");
                    return None;
                }
            };
            hub.update_cursor(&join.document_id, &join.user_id, position);
            Some(envelope.stamp(&join.user_id))
        }
        MessageType::UserTyping => {
            let typing: TypingData = match envelope.data_as() {
                Ok(typing) => typing,
                Err(err) => {
                    tracing::warn!("[Presence] Dropping user_typing with bad payload: {err}");
                    return None;
                }
            };
            hub.set_typing(&join.document_id, &join.user_id, typing.is_typing);
            Some(envelope.stamp(&join.user_id))
        }
        MessageType::AnnotationCreated
        | MessageType::AnnotationUpdated
        | MessageType::AnnotationDeleted => Some(envelope.stamp(&join.user_id)),
        MessageType::JoinDocument => {
            tracing::debug!("[Presence] Ignoring repeated join from {}", join.user_id);
            None
        }
        other => {
            tracing::debug!("[Presence] Ignoring {:?} from {}", other, join.user_id);
            None
        }
    }
}

async fn send_envelope(sink: &mut SplitSink<WebSocket, Message>, envelope: Envelope) -> bool {
    match envelope.encode() {
        Ok(encoded) => sink.send(Message::Text(encoded.into())).await.is_ok(),
        Err(err) => {
            tracing::error!("[Presence] Failed to encode envelope: {err}");
            true
        }
    }
}
