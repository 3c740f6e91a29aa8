//! Backend Module
//!
//! Server-side code: the batch ingest pipeline, chat log, presence hub
//! with WebSocket fan-out, HTTP routing, and server assembly.

/// Batch ingest pipeline and annotation store
pub mod ingest;

/// Chat log persistence and handlers
pub mod chat;

/// Presence rooms and WebSocket transport
pub mod realtime;

/// Gateway identity extraction
pub mod identity;

/// HTTP route configuration
pub mod routes;

/// Server state and initialization
pub mod server;

/// Backend error types
pub mod error;
