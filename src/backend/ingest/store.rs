/**
 * Annotation Dedup Store
 *
 * Keyed storage for universal annotations with at-most-one-creation-per-id
 * semantics. The store is consumed through the `AnnotationStorage`
 * capability trait so the in-process map can be swapped for an external
 * transactional store without touching the ingest pipeline.
 *
 * # Dedup Guarantee
 *
 * `put_if_absent` checks for an existing id and inserts under the same
 * write guard. There is no read-then-write window: a multi-writer backend
 * only needs to provide the same insert-or-report-existing primitive keyed
 * by (document_id, annotation_id).
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::shared::identifier::DocumentIdentifier;
use crate::shared::UniversalAnnotation;

/// Result of a conditional insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The annotation was stored; this id had never been seen
    Inserted,
    /// An annotation with this id already exists; nothing was written
    AlreadyExists,
}

/// Bibliographic record for an ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Canonical document id
    pub document_id: String,
    /// The identifier the document was first submitted under
    pub identifier: DocumentIdentifier,
    /// Document title
    pub title: String,
    /// Author list
    #[serde(default)]
    pub authors: Vec<String>,
    /// Journal or publisher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    /// Publication year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Storage capability for annotations and document records
///
/// All ingest operations go through this trait; nothing outside it assumes
/// the store is in-memory.
#[async_trait]
pub trait AnnotationStorage: Send + Sync {
    /// Look up one annotation by id within a document
    async fn get(&self, document_id: &str, annotation_id: &str) -> Option<UniversalAnnotation>;

    /// Insert an annotation unless its id already exists in the document
    ///
    /// The check and the insert happen atomically with respect to other
    /// writers of the same document.
    async fn put_if_absent(&self, annotation: UniversalAnnotation) -> PutOutcome;

    /// Replace an existing annotation; returns false when the id is absent
    async fn update(&self, annotation: UniversalAnnotation) -> bool;

    /// All annotations of a document, in insertion order
    async fn list(&self, document_id: &str) -> Vec<UniversalAnnotation>;

    /// Remove one annotation; returns false when the id is absent
    async fn remove(&self, document_id: &str, annotation_id: &str) -> bool;

    /// Remove every annotation of one document; returns how many were removed
    async fn clear_document(&self, document_id: &str) -> usize;

    /// Record or refresh a document's bibliographic info
    async fn upsert_document(&self, record: DocumentRecord);

    /// Look up a document's bibliographic info
    async fn get_document(&self, document_id: &str) -> Option<DocumentRecord>;
}

/// In-process reference implementation of `AnnotationStorage`
///
/// Annotations live in per-document vectors (insertion order preserved)
/// under a single async lock. Entries live for the store's lifetime; the
/// only eviction is the scoped `clear_document`.
#[derive(Debug, Clone, Default)]
pub struct MemoryAnnotationStore {
    annotations: Arc<RwLock<HashMap<String, Vec<UniversalAnnotation>>>>,
    documents: Arc<RwLock<HashMap<String, DocumentRecord>>>,
}

impl MemoryAnnotationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of annotations across all documents
    pub async fn total_annotations(&self) -> usize {
        self.annotations.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl AnnotationStorage for MemoryAnnotationStore {
    async fn get(&self, document_id: &str, annotation_id: &str) -> Option<UniversalAnnotation> {
        let annotations = self.annotations.read().await;
        annotations
            .get(document_id)?
            .iter()
            .find(|a| a.id == annotation_id)
            .cloned()
    }

    async fn put_if_absent(&self, annotation: UniversalAnnotation) -> PutOutcome {
        let mut annotations = self.annotations.write().await;
        let entries = annotations
            .entry(annotation.document_id.clone())
            .or_default();
        if entries.iter().any(|a| a.id == annotation.id) {
            return PutOutcome::AlreadyExists;
        }
        entries.push(annotation);
        PutOutcome::Inserted
    }

    async fn update(&self, annotation: UniversalAnnotation) -> bool {
        let mut annotations = self.annotations.write().await;
        let Some(entries) = annotations.get_mut(&annotation.document_id) else {
            return false;
        };
        match entries.iter_mut().find(|a| a.id == annotation.id) {
            Some(slot) => {
                *slot = annotation;
                true
            }
            None => false,
        }
    }

    async fn list(&self, document_id: &str) -> Vec<UniversalAnnotation> {
        self.annotations
            .read()
            .await
            .get(document_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn remove(&self, document_id: &str, annotation_id: &str) -> bool {
        let mut annotations = self.annotations.write().await;
        let Some(entries) = annotations.get_mut(document_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|a| a.id != annotation_id);
        entries.len() != before
    }

    async fn clear_document(&self, document_id: &str) -> usize {
        let removed = self
            .annotations
            .write()
            .await
            .remove(document_id)
            .map(|entries| entries.len())
            .unwrap_or(0);
        self.documents.write().await.remove(document_id);
        removed
    }

    async fn upsert_document(&self, record: DocumentRecord) {
        self.documents
            .write()
            .await
            .insert(record.document_id.clone(), record);
    }

    async fn get_document(&self, document_id: &str) -> Option<DocumentRecord> {
        self.documents.read().await.get(document_id).cloned()
    }
}
