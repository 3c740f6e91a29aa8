//! Shared Error Types
//!
//! This module defines error types that are shared between the client and
//! backend. They represent failure cases that can occur on either side of
//! the sync protocol.
//!
//! # Error Categories
//!
//! - `InvalidIdentifier` - Document identifier normalization failures
//! - `ValidationFailed` - Annotation validation failures
//! - `Transport` - Connection-level failures (non-fatal, retried)
//! - `Serialization` - JSON encoding/decoding failures
//!
//! # Usage
//!
//! ```rust
//! use annosync::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "text or comment is required");
//! ```
use thiserror::Error;

/// Error types that can occur on both the client and the backend
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// A document identifier could not be normalized
    #[error("Invalid identifier: {message}")]
    InvalidIdentifier {
        /// Human-readable error message
        message: String,
    },

    /// An annotation failed validation
    #[error("Validation error in field '{field}': {message}")]
    ValidationFailed {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A transport-level failure (connection drop, send on closed socket)
    ///
    /// Transport errors are transient: the presence connection retries them
    /// with backoff and only surfaces a persistent error string once the
    /// reconnect cap is exhausted.
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new invalid-identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            message: message.into(),
        }
    }

    /// Create a new validation error for a specific field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
