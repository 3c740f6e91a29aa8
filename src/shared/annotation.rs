//! Universal Annotation Schema
//!
//! Every client platform ships its own native annotation format. This module
//! defines the platform-neutral schema all of them convert to, plus the
//! normalizer that performs the conversion at ingest time.
//!
//! # Normalization Contract
//!
//! - The annotation type must be one of the supported kinds.
//! - Content must carry non-empty text OR a non-empty comment.
//! - A missing id gets a freshly generated UUID.
//! - `created_at` defaults to now when the platform didn't record it;
//!   `modified_at` is always the ingestion time, distinct from the original
//!   authoring time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Supported annotation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// A highlighted text range
    Highlight,
    /// A freestanding or anchored note
    Note,
    /// An image clipping
    Image,
    /// A freehand drawing overlay
    Drawing,
}

impl AnnotationType {
    /// Wire tag for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::Note => "note",
            Self::Image => "image",
            Self::Drawing => "drawing",
        }
    }
}

impl FromStr for AnnotationType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highlight" => Ok(Self::Highlight),
            "note" => Ok(Self::Note),
            "image" => Ok(Self::Image),
            "drawing" => Ok(Self::Drawing),
            other => Err(SharedError::validation(
                "type",
                format!("Unsupported annotation type: {other}"),
            )),
        }
    }
}

/// Who can see an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the author
    #[default]
    Private,
    /// Collaborators on the same document
    Shared,
    /// Anyone with the document id
    Public,
}

/// Annotation body: selected text, user commentary, rendering hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationContent {
    /// The selected/highlighted text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The user's commentary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Display color (platform-specific format, passed through)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Anchor position; shape varies per platform (page/offset/region)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<serde_json::Value>,
}

impl AnnotationContent {
    /// Whether the content satisfies the non-empty text-or-comment rule
    pub fn has_substance(&self) -> bool {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.text) || filled(&self.comment)
    }
}

/// Annotation provenance and sharing metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMetadata {
    /// Originating platform (set from the batch `source`)
    #[serde(default)]
    pub platform: String,
    /// Author display name or id as the platform knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Sharing level
    #[serde(default)]
    pub visibility: Visibility,
    /// Platform-specific permission blob, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<serde_json::Value>,
    /// Snapshot of the source document's bibliographic info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_info: Option<serde_json::Value>,
}

/// The platform-neutral annotation all native formats convert to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalAnnotation {
    /// Unique within a document id
    pub id: String,
    /// Annotation kind
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    /// Canonical document id this annotation belongs to
    pub document_id: String,
    /// Original authoring time (platform-reported, defaulted at ingest)
    pub created_at: DateTime<Utc>,
    /// Last server-side mutation time (set at ingest and on update)
    pub modified_at: DateTime<Utc>,
    /// Monotonic per-annotation revision counter
    pub version: u32,
    /// Annotation body
    pub content: AnnotationContent,
    /// Provenance and sharing metadata
    pub metadata: AnnotationMetadata,
}

/// An annotation in a platform's native submission form
///
/// Everything is optional or loosely typed; the normalizer is the validation
/// boundary. The `type` field stays a string here so an unsupported kind is a
/// per-item validation error rather than a batch-level parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeAnnotation {
    /// Client-assigned id, if the platform has stable ids
    #[serde(default)]
    pub id: Option<String>,
    /// Annotation kind as a raw string
    #[serde(rename = "type", default)]
    pub annotation_type: String,
    /// Annotation body
    #[serde(default)]
    pub content: AnnotationContent,
    /// Original authoring time, if the platform recorded one
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Client-claimed revision
    #[serde(default)]
    pub version: Option<u32>,
    /// Native metadata, merged into the universal form
    #[serde(default)]
    pub metadata: AnnotationMetadata,
}

/// Convert a native annotation into the universal schema
///
/// # Arguments
///
/// * `native` - The platform's submission
/// * `document_id` - Canonical document id the batch resolved to
/// * `platform` - The batch `source`, recorded as the annotation's platform
///
/// # Errors
///
/// `SharedError::ValidationFailed` when the type is unsupported or the
/// content has neither text nor comment.
pub fn normalize_annotation(
    native: NativeAnnotation,
    document_id: &str,
    platform: &str,
) -> Result<UniversalAnnotation, SharedError> {
    let annotation_type = AnnotationType::from_str(&native.annotation_type)?;

    if !native.content.has_substance() {
        return Err(SharedError::validation(
            "content",
            "Annotation must have non-empty text or comment",
        ));
    }

    let now = Utc::now();
    let id = native
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut metadata = native.metadata;
    metadata.platform = platform.to_string();

    Ok(UniversalAnnotation {
        id,
        annotation_type,
        document_id: document_id.to_string(),
        created_at: native.created_at.unwrap_or(now),
        modified_at: now,
        version: native.version.unwrap_or(1),
        content: native.content,
        metadata,
    })
}
