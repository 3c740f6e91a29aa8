/**
 * Batch Ingest HTTP Handlers
 *
 * HTTP surface of the ingest pipeline:
 *
 * - `POST /api/annotations` - submit a batch against a document identifier
 * - `GET /api/annotations?doi=|?documentId=` - fetch a document's annotations
 * - `PUT /api/annotations/{documentId}/{annotationId}` - explicit update
 * - `DELETE /api/annotations?documentId=` - scoped reset of one document
 *
 * Request-shape problems (missing documentInfo/identifier/title, a
 * non-array annotations field, a malformed DOI) fail the whole call with a
 * field-specific 400. Per-annotation problems never do; they come back as
 * per-item statuses in a 201 response.
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::backend::error::ApiError;
use crate::backend::ingest::batch::{process_batch, BatchItemOutcome, ItemStatus};
use crate::backend::ingest::store::DocumentRecord;
use crate::backend::server::state::AppState;
use crate::shared::annotation::{normalize_annotation, NativeAnnotation};
use crate::shared::identifier::{DocumentIdentifier, IdentifierType};
use crate::shared::{ApiResponse, SharedError, UniversalAnnotation};

/// Body of `POST /api/annotations`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    document_info: Option<DocumentInfoPayload>,
    #[serde(default)]
    annotations: Option<serde_json::Value>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    version: Option<String>,
}

/// The `documentInfo` block of an ingest request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentInfoPayload {
    /// Raw identifier value; parsed manually for field-specific errors
    #[serde(default)]
    identifier: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    publication: Option<String>,
    #[serde(default)]
    year: Option<i32>,
}

/// Successful ingest payload
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestData {
    pub document_id: String,
    pub processed_count: usize,
    pub annotations: Vec<BatchItemOutcome>,
}

/// Successful fetch payload
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentAnnotationsData {
    pub document: DocumentRecord,
    pub annotations: Vec<UniversalAnnotation>,
    pub total: usize,
}

/// Map identifier failures to plain 400 messages ("Invalid DOI format")
fn identifier_error(err: SharedError) -> ApiError {
    match err {
        SharedError::InvalidIdentifier { message } => ApiError::bad_request(message),
        other => other.into(),
    }
}

/// Handle `POST /api/annotations`
pub async fn ingest_annotations(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let info = body
        .document_info
        .ok_or_else(|| ApiError::bad_request("Missing documentInfo"))?;

    let identifier_value = info
        .identifier
        .ok_or_else(|| ApiError::bad_request("Missing document identifier"))?;

    let title = info
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing document title"))?
        .to_string();

    let items = body
        .annotations
        .as_ref()
        .and_then(|a| a.as_array())
        .cloned()
        .ok_or_else(|| ApiError::bad_request("annotations must be an array"))?;

    let identifier: DocumentIdentifier = serde_json::from_value(identifier_value)
        .map_err(|_| ApiError::bad_request("Invalid document identifier"))?;

    if identifier.id_type == IdentifierType::Doi && !identifier.raw.trim().starts_with("10.") {
        return Err(ApiError::bad_request("Invalid DOI format"));
    }

    let document_id = identifier.document_id().map_err(identifier_error)?;
    let source = body.source.unwrap_or_else(|| "unknown".to_string());

    state
        .annotation_store
        .upsert_document(DocumentRecord {
            document_id: document_id.clone(),
            identifier,
            title,
            authors: info.authors,
            publication: info.publication,
            year: info.year,
        })
        .await;

    let outcomes = process_batch(
        state.annotation_store.as_ref(),
        &document_id,
        items,
        &source,
    )
    .await;

    let created = outcomes
        .iter()
        .filter(|o| o.status == ItemStatus::Created)
        .count();
    tracing::info!(
        "[Ingest] {} of {} annotations created for {}",
        created,
        outcomes.len(),
        document_id
    );

    let data = IngestData {
        document_id,
        processed_count: created,
        annotations: outcomes,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            format!("Processed {created} annotations"),
            data,
        )),
    ))
}

/// Query of `GET`/`DELETE /api/annotations`
#[derive(Debug, Deserialize)]
pub struct AnnotationsQuery {
    #[serde(default)]
    doi: Option<String>,
    #[serde(default, rename = "documentId")]
    document_id: Option<String>,
}

impl AnnotationsQuery {
    /// Resolve the query to a canonical document id
    fn resolve(&self) -> Result<String, ApiError> {
        if let Some(doi) = &self.doi {
            return DocumentIdentifier::new(IdentifierType::Doi, doi.clone())
                .document_id()
                .map_err(identifier_error);
        }
        self.document_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing doi or documentId"))
    }
}

/// Handle `GET /api/annotations`
pub async fn get_document_annotations(
    State(state): State<AppState>,
    Query(query): Query<AnnotationsQuery>,
) -> Result<Json<ApiResponse<DocumentAnnotationsData>>, ApiError> {
    let document_id = query.resolve()?;

    let document = state
        .annotation_store
        .get_document(&document_id)
        .await
        .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let annotations = state.annotation_store.list(&document_id).await;
    let total = annotations.len();
    Ok(Json(ApiResponse::ok(DocumentAnnotationsData {
        document,
        annotations,
        total,
    })))
}

/// Payload of a scoped delete
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedData {
    pub removed: usize,
}

/// Handle `DELETE /api/annotations?documentId=`
///
/// Deletion is scoped to one document; there is deliberately no
/// clear-everything form.
pub async fn clear_document_annotations(
    State(state): State<AppState>,
    Query(query): Query<AnnotationsQuery>,
) -> Result<Json<ApiResponse<ClearedData>>, ApiError> {
    let document_id = query
        .document_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("documentId is required"))?;

    let removed = state.annotation_store.clear_document(&document_id).await;
    tracing::info!("[Ingest] Cleared {} annotations from {}", removed, document_id);
    Ok(Json(ApiResponse::ok(ClearedData { removed })))
}

/// Payload of an explicit update
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedData {
    pub annotation: UniversalAnnotation,
    pub status: ItemStatus,
}

/// Handle `PUT /api/annotations/{documentId}/{annotationId}`
///
/// The only path that mutates a stored annotation: replaces content and
/// metadata, bumps `version`, refreshes `modified_at`. The authoring time
/// and id are preserved from the stored annotation.
pub async fn update_annotation(
    State(state): State<AppState>,
    Path((document_id, annotation_id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<UpdatedData>>, ApiError> {
    let existing = state
        .annotation_store
        .get(&document_id, &annotation_id)
        .await
        .ok_or_else(|| ApiError::not_found("Annotation not found"))?;

    let mut native: NativeAnnotation = serde_json::from_value(body)
        .map_err(|err| ApiError::bad_request(format!("Malformed annotation: {err}")))?;
    if native.annotation_type.is_empty() {
        native.annotation_type = existing.annotation_type.as_str().to_string();
    }

    let mut updated = normalize_annotation(native, &document_id, &existing.metadata.platform)?;
    updated.id = existing.id.clone();
    updated.created_at = existing.created_at;
    updated.version = existing.version + 1;

    if !state.annotation_store.update(updated.clone()).await {
        return Err(ApiError::not_found("Annotation not found"));
    }

    Ok(Json(ApiResponse::ok(UpdatedData {
        annotation: updated,
        status: ItemStatus::Updated,
    })))
}
