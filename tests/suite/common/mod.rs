//! Shared test helpers: app assembly and request builders

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use sqlx::sqlite::SqlitePoolOptions;

use annosync::backend::chat::db::run_migrations;
use annosync::backend::ingest::store::{AnnotationStorage, MemoryAnnotationStore};
use annosync::backend::realtime::hub::PresenceHub;
use annosync::backend::routes::router::create_router;
use annosync::backend::server::state::AppState;

/// App state over a fresh in-memory store and SQLite database
pub async fn test_state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");

    let store: Arc<dyn AnnotationStorage> = Arc::new(MemoryAnnotationStore::new());
    AppState::new(store, PresenceHub::new(), Some(pool))
}

/// In-process test server over a fresh app state
pub async fn test_server() -> TestServer {
    TestServer::new(create_router(test_state().await)).expect("test server")
}

/// Serve a fresh app on an ephemeral local port (for WebSocket tests)
pub async fn spawn_app() -> (SocketAddr, AppState) {
    let state = test_state().await;
    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, state)
}

/// A well-formed ingest body for one DOI document
pub fn doi_batch(doi: &str, annotations: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "documentInfo": {
            "identifier": {"type": "doi", "value": doi, "normalized": doi},
            "title": "A Study of Margins",
            "authors": ["Ada Lovelace"],
            "year": 2026
        },
        "annotations": annotations,
        "source": "browser-extension",
        "version": "1.0"
    })
}

/// Await a condition with a hard deadline
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F, what: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}
