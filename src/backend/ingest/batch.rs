/**
 * Batch Ingest Protocol
 *
 * Processes one batch of native annotations against a document's dedup
 * store, producing a per-item status in submission order. Submission is
 * idempotent: resubmitting an already-ingested id (or repeating an id
 * inside one batch) is a skip, never an overwrite, so clients can blindly
 * re-send their whole local annotation set after going offline.
 *
 * # Per-Item Statuses
 *
 * - `created` - first time this id was seen; the annotation is now stored
 * - `updated` - produced by the explicit update flow, never by batch ingest
 * - `skipped` - duplicate of a stored annotation or of an earlier batch item
 * - `error` - the item failed validation; the rest of the batch continues
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::backend::ingest::store::{AnnotationStorage, PutOutcome};
use crate::shared::annotation::{normalize_annotation, NativeAnnotation};

/// Outcome status of one batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Stored for the first time
    Created,
    /// Replaced via the explicit update flow
    Updated,
    /// Duplicate id; the stored annotation is untouched
    Skipped,
    /// Failed validation; isolated from the rest of the batch
    Error,
}

/// Per-item result reported back to the submitting client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemOutcome {
    /// The annotation id (client-supplied or server-generated); absent when
    /// the item failed before an id could be established
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// What happened to this item
    pub status: ItemStatus,
    /// Why, for skipped/error items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BatchItemOutcome {
    fn created(id: String) -> Self {
        Self {
            id: Some(id),
            status: ItemStatus::Created,
            message: None,
        }
    }

    fn skipped(id: String, message: &str) -> Self {
        Self {
            id: Some(id),
            status: ItemStatus::Skipped,
            message: Some(message.to_string()),
        }
    }

    fn error(id: Option<String>, message: String) -> Self {
        Self {
            id,
            status: ItemStatus::Error,
            message: Some(message),
        }
    }
}

/// Process a batch of native annotations against one document's store
///
/// Items are handled independently and in submission order; a bad item
/// never aborts the batch. Dedup applies both against pre-batch store state
/// and against earlier items of the same batch (first occurrence wins).
///
/// # Arguments
///
/// * `store` - The annotation storage capability
/// * `document_id` - Canonical document id the batch resolved to
/// * `items` - Raw annotation values as submitted
/// * `source` - The submitting platform, recorded on each annotation
pub async fn process_batch(
    store: &dyn AnnotationStorage,
    document_id: &str,
    items: Vec<serde_json::Value>,
    source: &str,
) -> Vec<BatchItemOutcome> {
    let mut outcomes = Vec::with_capacity(items.len());
    let mut seen_ids: HashSet<String> = HashSet::new();

    for item in items {
        let native: NativeAnnotation = match serde_json::from_value(item) {
            Ok(native) => native,
            Err(err) => {
                outcomes.push(BatchItemOutcome::error(
                    None,
                    format!("Malformed annotation: {err}"),
                ));
                continue;
            }
        };

        // Dedup on client-supplied ids happens before validation so a
        // resubmission of an existing annotation is a skip even when the
        // resubmitted copy would no longer validate.
        if let Some(id) = native.id.as_deref() {
            if seen_ids.contains(id) {
                outcomes.push(BatchItemOutcome::skipped(
                    id.to_string(),
                    "duplicate id in batch",
                ));
                continue;
            }
            if store.get(document_id, id).await.is_some() {
                seen_ids.insert(id.to_string());
                outcomes.push(BatchItemOutcome::skipped(id.to_string(), "already exists"));
                continue;
            }
        }

        let claimed_id = native.id.clone();
        let annotation = match normalize_annotation(native, document_id, source) {
            Ok(annotation) => annotation,
            Err(err) => {
                outcomes.push(BatchItemOutcome::error(claimed_id, err.to_string()));
                continue;
            }
        };

        let id = annotation.id.clone();
        seen_ids.insert(id.clone());
        match store.put_if_absent(annotation).await {
            PutOutcome::Inserted => outcomes.push(BatchItemOutcome::created(id)),
            // A concurrent writer got there between our pre-check and the
            // insert; the at-most-one-creation guarantee holds either way.
            PutOutcome::AlreadyExists => {
                outcomes.push(BatchItemOutcome::skipped(id, "already exists"))
            }
        }
    }

    outcomes
}
