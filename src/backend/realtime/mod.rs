//! Real-time Presence Module
//!
//! The server half of the presence transport: per-document rooms with
//! broadcast fan-out, and the WebSocket session handler that enforces the
//! join-first protocol and originator stamping.

/// Per-document presence rooms
pub mod hub;

/// WebSocket session handler
pub mod ws;

pub use hub::PresenceHub;
pub use ws::handle_presence_socket;
