/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server. These
 * errors are used in HTTP handlers and convert to HTTP responses with the
 * standard `{success:false, message}` body.
 *
 * # Error Taxonomy
 *
 * - Request-shape errors fail the whole call (400)
 * - Missing gateway identity headers are 401
 * - Ownership violations are 403, never retried
 * - Storage failures are 500 and logged; their details are not leaked
 *
 * Per-item annotation failures are NOT errors at this level: they surface
 * as `status=error` entries inside an otherwise-successful batch response.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// Each variant maps to one HTTP status code via [`ApiError::status_code`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request (missing fields, bad identifiers)
    #[error("{message}")]
    BadRequest {
        /// Human-readable error message
        message: String,
    },

    /// Missing or unusable gateway identity headers
    #[error("{message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// The authenticated user does not own the target resource
    #[error("{message}")]
    PermissionDenied {
        /// Human-readable error message
        message: String,
    },

    /// The target resource does not exist
    #[error("{message}")]
    NotFound {
        /// Human-readable error message
        message: String,
    },

    /// Internal failure with no client-actionable detail
    #[error("{message}")]
    Internal {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (identifier/validation failures from the shared module)
    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Chat storage failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON encoding failure while building a response
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Create a new bad-request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new permission-denied error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shared(err) => match err {
                SharedError::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
                SharedError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
                SharedError::Transport { .. } => StatusCode::BAD_GATEWAY,
                SharedError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to clients
    ///
    /// Storage and serialization failures are logged server-side but never
    /// echoed to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Serialization(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
