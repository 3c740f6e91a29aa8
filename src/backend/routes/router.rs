/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines all
 * route configurations into a single Axum router.
 *
 * # Routes
 *
 * ## Annotation Ingest
 *
 * - `POST /api/annotations` - Batch ingest against a document identifier
 * - `GET /api/annotations` - Fetch a document's annotations (by doi or id)
 * - `DELETE /api/annotations` - Scoped reset of one document
 * - `PUT /api/annotations/{documentId}/{annotationId}` - Explicit update
 *
 * ## Chat
 *
 * - `GET /api/chat/messages` - Paged or since-cursor listing
 * - `POST /api/chat/messages` - Append as the authenticated user
 * - `DELETE /api/chat/messages` - Author-only deletion
 *
 * ## Presence
 *
 * - `GET /ws` - WebSocket upgrade for the presence transport
 */

use axum::http::StatusCode;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::chat::handlers::{
    delete_chat_message, list_chat_messages, post_chat_message,
};
use crate::backend::ingest::handlers::{
    clear_document_annotations, get_document_annotations, ingest_annotations, update_annotation,
};
use crate::backend::realtime::ws::handle_presence_socket;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the annotation store,
///   presence hub, and chat database pool
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route(
            "/api/annotations",
            axum::routing::post(ingest_annotations)
                .get(get_document_annotations)
                .delete(clear_document_annotations),
        )
        .route(
            "/api/annotations/{document_id}/{annotation_id}",
            axum::routing::put(update_annotation),
        )
        .route(
            "/api/chat/messages",
            axum::routing::get(list_chat_messages)
                .post(post_chat_message)
                .delete(delete_chat_message),
        )
        .route("/ws", axum::routing::get(handle_presence_socket));

    // Request logging
    let router = router.layer(TraceLayer::new_for_http());

    // Fallback handler for unknown routes
    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router.with_state(app_state)
}
