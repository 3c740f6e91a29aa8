/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container:
 * - The annotation store, held as the `AnnotationStorage` capability so the
 *   in-memory reference store can be swapped for an external one
 * - The presence hub (per-document rooms + broadcast channels)
 * - The optional chat database pool
 *
 * # Thread Safety
 *
 * All fields are cheap clones over shared interior state and safe for
 * concurrent handler access.
 */

use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::backend::ingest::store::AnnotationStorage;
use crate::backend::realtime::hub::PresenceHub;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Annotation dedup store behind its storage capability
    pub annotation_store: Arc<dyn AnnotationStorage>,

    /// Per-document presence rooms and broadcast fan-out
    pub presence_hub: PresenceHub,

    /// Chat database connection pool
    ///
    /// `None` when the database failed to initialize; chat handlers report
    /// a server error in that case while ingest and presence keep working.
    pub db_pool: Option<SqlitePool>,
}

impl AppState {
    /// Assemble the application state
    pub fn new(
        annotation_store: Arc<dyn AnnotationStorage>,
        presence_hub: PresenceHub,
        db_pool: Option<SqlitePool>,
    ) -> Self {
        Self {
            annotation_store,
            presence_hub,
            db_pool,
        }
    }
}

/// Allow handlers to extract the annotation store directly
impl FromRef<AppState> for Arc<dyn AnnotationStorage> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.annotation_store.clone()
    }
}

/// Allow handlers to extract the presence hub directly
impl FromRef<AppState> for PresenceHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence_hub.clone()
    }
}

/// Allow handlers to extract the optional database pool directly
impl FromRef<AppState> for Option<SqlitePool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
