//! Backend Error Module
//!
//! Error types specific to the backend server and their conversion into
//! HTTP responses.

/// Error type definitions
pub mod types;

/// Conversion to HTTP responses
pub mod conversion;

pub use types::ApiError;
