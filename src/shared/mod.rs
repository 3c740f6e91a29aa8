//! Shared Module
//!
//! Types and data structures shared between the client and the backend:
//! document identifiers, the universal annotation schema, presence types,
//! the transport envelope, and error types. Everything here is designed for
//! serialization and transmission over HTTP or the WebSocket transport.

/// Document identity resolution (DOI/ISBN/PMID/platform keys)
pub mod identifier;

/// Universal annotation schema and normalizer
pub mod annotation;

/// Presence types (collaborators, cursors)
pub mod presence;

/// Transport message envelope
pub mod envelope;

/// Chat message types
pub mod chat;

/// API response envelope
pub mod response;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use annotation::{
    normalize_annotation, AnnotationContent, AnnotationMetadata, AnnotationType,
    NativeAnnotation, UniversalAnnotation, Visibility,
};
pub use chat::ChatMessage;
pub use envelope::{Envelope, MessageType};
pub use error::SharedError;
pub use identifier::{DocumentIdentifier, IdentifierType};
pub use presence::{CollaborationUser, CursorPosition};
pub use response::ApiResponse;
