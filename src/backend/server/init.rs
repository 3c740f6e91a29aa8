/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP
 * server: state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Create the annotation store and presence hub
 * 2. Load the chat database (optional; ingest and presence work without it)
 * 3. Create and configure the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::ingest::store::{AnnotationStorage, MemoryAnnotationStore};
use crate::backend::realtime::hub::PresenceHub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing annosync backend server");

    let annotation_store: Arc<dyn AnnotationStorage> = Arc::new(MemoryAnnotationStore::new());
    let presence_hub = PresenceHub::new();
    let db_pool = load_database().await;

    tracing::info!("Annotation store and presence hub initialized");

    create_router(AppState::new(annotation_store, presence_hub, db_pool))
}
