//! Chat Backend Module
//!
//! Server-side chat log: SQLite persistence and HTTP handlers. The chat
//! log is the adjunct channel next to the presence transport; clients poll
//! it with a since-cursor rather than subscribing.

/// Storage layer
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::DeleteOutcome;
