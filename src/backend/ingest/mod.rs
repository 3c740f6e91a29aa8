//! Annotation Ingest Module
//!
//! Server-side ingest pipeline: the dedup store behind its storage
//! capability trait, the batch protocol, and the HTTP handlers.

/// Storage capability and the in-memory reference store
pub mod store;

/// Batch processing with per-item statuses
pub mod batch;

/// HTTP handlers
pub mod handlers;

pub use batch::{process_batch, BatchItemOutcome, ItemStatus};
pub use store::{AnnotationStorage, DocumentRecord, MemoryAnnotationStore, PutOutcome};
