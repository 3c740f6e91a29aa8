//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.

/// Environment configuration
pub mod config;

/// Application state
pub mod state;

/// Application assembly
pub mod init;

pub use state::AppState;
