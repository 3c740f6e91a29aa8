//! Two-client presence scenarios over a real listener
//!
//! These drive the whole transport path: client supervisor ->
//! tokio-tungstenite -> axum WebSocket handler -> presence hub fan-out ->
//! remote event router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use annosync::client::connection::{ConnectionState, PresenceClient, PresenceConfig};
use annosync::client::router::EventRouter;
use annosync::shared::annotation::{normalize_annotation, AnnotationContent, NativeAnnotation};
use annosync::shared::UniversalAnnotation;

use crate::common::{spawn_app, wait_until};

fn annotation(id: &str, document_id: &str) -> UniversalAnnotation {
    let native = NativeAnnotation {
        id: Some(id.to_string()),
        annotation_type: "highlight".to_string(),
        content: AnnotationContent {
            text: Some("shared insight".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    normalize_annotation(native, document_id, "test").unwrap()
}

async fn connected_client(url: &str, document_id: &str, user_id: &str, router: EventRouter) -> PresenceClient {
    let client = PresenceClient::new(PresenceConfig::new(url, document_id, user_id), router);
    client.connect().await;
    let state = client.state_watch();
    wait_until(
        || *state.borrow() == ConnectionState::Connected,
        "client to connect",
    )
    .await;
    client
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_annotation_fires_without_echo() {
    let (addr, _state) = spawn_app().await;
    let url = format!("ws://{addr}/ws");

    // Client A: its own annotation_created must never come back to it
    let a_echoes = Arc::new(AtomicUsize::new(0));
    let a_counter = a_echoes.clone();
    let a_router = EventRouter::new("u1").on_annotation_created(move |_| {
        a_counter.fetch_add(1, Ordering::SeqCst);
    });

    // Client B: captures what it receives
    let (b_tx, mut b_rx) = mpsc::unbounded_channel::<serde_json::Value>();
    let b_router = EventRouter::new("u2").on_annotation_created(move |payload| {
        let _ = b_tx.send(payload);
    });

    let client_a = connected_client(&url, "doc1", "u1", a_router).await;
    let client_b = connected_client(&url, "doc1", "u2", b_router).await;

    // A sees B arrive before broadcasting
    let a_registry = client_a.registry();
    wait_until(|| a_registry.get("u2").is_some(), "A to see B join").await;

    // B joined second, so B's snapshot already contained A
    let b_registry = client_b.registry();
    wait_until(|| b_registry.get("u1").is_some(), "B to see A").await;

    client_a
        .send_annotation_created(&annotation("ann1", "doc1"))
        .await
        .expect("send while connected");

    let payload = tokio::time::timeout(Duration::from_secs(5), b_rx.recv())
        .await
        .expect("B should receive the annotation")
        .expect("channel open");
    assert_eq!(payload["id"], "ann1");
    assert_eq!(payload["documentId"], "doc1");

    // B has processed the broadcast; A's own callback must not have fired
    assert_eq!(a_echoes.load(Ordering::SeqCst), 0);

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_leave_removes_user_from_remote_registries() {
    let (addr, _state) = spawn_app().await;
    let url = format!("ws://{addr}/ws");

    let client_a = connected_client(&url, "doc1", "u1", EventRouter::new("u1")).await;
    let client_b = connected_client(&url, "doc1", "u2", EventRouter::new("u2")).await;

    let a_registry = client_a.registry();
    wait_until(|| a_registry.get("u2").is_some(), "A to see B join").await;

    client_b.disconnect();
    wait_until(|| a_registry.get("u2").is_none(), "A to see B leave").await;

    client_a.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cursor_and_typing_reach_other_clients_only() {
    let (addr, _state) = spawn_app().await;
    let url = format!("ws://{addr}/ws");

    let client_a = connected_client(&url, "doc1", "u1", EventRouter::new("u1")).await;
    let client_b = connected_client(&url, "doc1", "u2", EventRouter::new("u2")).await;

    let b_registry = client_b.registry();
    wait_until(|| b_registry.get("u1").is_some(), "B to see A").await;

    client_a
        .send_cursor_move(annosync::shared::CursorPosition { page: 3, x: 0.4, y: 0.6 })
        .await
        .expect("cursor send");
    client_a.send_typing(true, Some("chat".to_string())).await.expect("typing send");

    wait_until(
        || {
            b_registry
                .get("u1")
                .is_some_and(|u| u.cursor.is_some() && u.is_typing == Some(true))
        },
        "B to see A's cursor and typing state",
    )
    .await;
    assert_eq!(b_registry.get("u1").unwrap().cursor.unwrap().page, 3);

    // A's registry never grew an entry for itself
    assert!(client_a.registry().get("u1").is_none());

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_presence_is_scoped_per_document() {
    let (addr, _state) = spawn_app().await;
    let url = format!("ws://{addr}/ws");

    let client_a = connected_client(&url, "doc1", "u1", EventRouter::new("u1")).await;
    let client_b = connected_client(&url, "doc2", "u2", EventRouter::new("u2")).await;

    // Give the fan-out a moment; neither should ever see the other
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client_a.registry().is_empty());
    assert!(client_b.registry().is_empty());

    client_a.disconnect();
    client_b.disconnect();
}
