//! Annosync - Main Library
//!
//! Annosync is the real-time collaborative annotation synchronization
//! subsystem behind a cross-platform reading stack: it normalizes
//! annotations produced by heterogeneous client applications against a
//! canonical document identifier (DOI/ISBN/PMID), deduplicates batch
//! submissions idempotently, and fans annotations, cursors, and typing
//! state out to every collaborator on the same document in real time.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between client and backend
//!   - Document identifiers and the canonical-id resolver
//!   - The Universal Annotation schema and normalizer
//!   - Transport envelope, presence and chat types, error types
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server with batch ingest and chat endpoints
//!   - Annotation dedup store behind an injected storage capability
//!   - Presence hub and WebSocket broadcast fan-out
//!   - SQLite persistence for the chat log
//!
//! - **`client`** - Client-side collaboration library
//!   - Presence connection with an explicit reconnect state machine
//!   - Event router with echo suppression
//!   - Local presence registry and since-cursor chat polling
//!
//! # Delivery Semantics
//!
//! Messages on one open connection arrive in send order. Across a
//! reconnect, ordering is not guaranteed: the `document_users` snapshot is
//! the authoritative resync point and in-flight events during the gap may
//! be lost (at-most-once delivery).
//!
//! # Usage
//!
//! Server:
//!
//! ```rust,no_run
//! # async fn example() {
//! let app = annosync::backend::server::init::create_app().await;
//! // Serve with axum
//! # }
//! ```
//!
//! Client:
//!
//! ```rust,no_run
//! use annosync::client::connection::{PresenceClient, PresenceConfig};
//! use annosync::client::router::EventRouter;
//!
//! # async fn example() {
//! let router = EventRouter::new("u1");
//! let client = PresenceClient::new(
//!     PresenceConfig::new("ws://localhost:3000/ws", "doc1", "u1"),
//!     router,
//! );
//! client.connect().await;
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;

/// Client-side collaboration library
pub mod client;
