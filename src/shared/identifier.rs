//! Document Identity Resolution
//!
//! Client applications submit annotations against whatever identifier their
//! platform happens to know: a DOI from a publisher page, an ISBN from a
//! reference manager, a PMID from PubMed, or a platform-native key. This
//! module normalizes all of them into one canonical, deterministic document
//! id so annotations from different sources land in the same partition.
//!
//! # Invariants
//!
//! - `normalize` is a pure function of `(type, raw)`: same input, same
//!   output, no storage round trip.
//! - `normalize(normalize(x)) == normalize(x)` for every valid input.
//! - Percent-decoding applies only to URL-form DOIs; a bare DOI string is
//!   never decoded.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::shared::error::SharedError;

/// DOI syntax: a registrant prefix `10.NNNN…` and a non-empty suffix.
static DOI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{4,}/\S+$").expect("DOI pattern is valid"));

/// URL and scheme prefixes that publishers wrap around bare DOIs.
const DOI_PREFIXES: &[&str] = &[
    "doi:",
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "https://www.doi.org/",
    "dx.doi.org/",
    "www.doi.org/",
    "doi.org/",
];

/// The kind of external identifier a document was submitted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierType {
    /// Digital Object Identifier (journal articles, datasets)
    Doi,
    /// International Standard Book Number
    Isbn,
    /// PubMed identifier
    Pmid,
    /// A platform-native key with no external registry
    PlatformKey,
}

impl IdentifierType {
    /// Wire/document-id tag for this identifier type
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::Isbn => "isbn",
            Self::Pmid => "pmid",
            Self::PlatformKey => "platform-key",
        }
    }
}

impl std::fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A heterogeneous document identifier as submitted by a client
///
/// `normalized` is whatever the client claims the canonical form is; it is
/// carried for diagnostics but never trusted — the resolver always
/// recomputes normalization from `(type, value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentIdentifier {
    /// Identifier kind
    #[serde(rename = "type")]
    pub id_type: IdentifierType,
    /// The raw identifier string as the client knows it
    #[serde(rename = "value", alias = "raw")]
    pub raw: String,
    /// Client-claimed normalized form (informational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
}

impl DocumentIdentifier {
    /// Create an identifier from a type and raw value
    pub fn new(id_type: IdentifierType, raw: impl Into<String>) -> Self {
        Self {
            id_type,
            raw: raw.into(),
            normalized: None,
        }
    }

    /// Normalize this identifier into its canonical string form
    ///
    /// # Errors
    ///
    /// Returns `SharedError::InvalidIdentifier` when the raw value does not
    /// parse as its claimed type (e.g. a DOI that fails the
    /// `10.\d{4,}/suffix` shape).
    pub fn normalize(&self) -> Result<String, SharedError> {
        match self.id_type {
            IdentifierType::Doi => normalize_doi(&self.raw),
            IdentifierType::Isbn => normalize_isbn(&self.raw),
            IdentifierType::Pmid => normalize_pmid(&self.raw),
            IdentifierType::PlatformKey => {
                let trimmed = self.raw.trim();
                if trimmed.is_empty() {
                    return Err(SharedError::invalid_identifier("Empty platform key"));
                }
                Ok(trimmed.to_string())
            }
        }
    }

    /// Derive the canonical document id for this identifier
    ///
    /// The id is `{type}_{normalized}` with every non-alphanumeric character
    /// of the normalized form replaced by `_`. Deterministic across calls
    /// and process restarts; used as the partition key for annotations and
    /// presence.
    pub fn document_id(&self) -> Result<String, SharedError> {
        let normalized = self.normalize()?;
        let safe: String = normalized
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Ok(format!("{}_{}", self.id_type.tag(), safe))
    }
}

/// Normalize a DOI: strip scheme/URL prefix variants case-insensitively,
/// percent-decode URL forms, lowercase, and validate the DOI shape.
fn normalize_doi(raw: &str) -> Result<String, SharedError> {
    let mut doi = raw.trim().to_ascii_lowercase();

    let mut was_url_form = false;
    let mut stripped = true;
    while stripped {
        stripped = false;
        for prefix in DOI_PREFIXES {
            if let Some(rest) = doi.strip_prefix(prefix) {
                was_url_form = was_url_form || prefix.contains('/');
                doi = rest.to_string();
                stripped = true;
            }
        }
    }

    if was_url_form {
        doi = percent_decode_str(&doi)
            .decode_utf8()
            .map_err(|_| SharedError::invalid_identifier("Invalid DOI format"))?
            .to_ascii_lowercase();
    }

    if !DOI_PATTERN.is_match(&doi) {
        return Err(SharedError::invalid_identifier("Invalid DOI format"));
    }
    Ok(doi)
}

/// Normalize an ISBN: strip separators, uppercase, require 10 or 13 chars.
fn normalize_isbn(raw: &str) -> Result<String, SharedError> {
    let isbn: String = raw
        .trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    let valid = match isbn.len() {
        10 => {
            isbn[..9].chars().all(|c| c.is_ascii_digit())
                && isbn.chars().nth(9).is_some_and(|c| c.is_ascii_digit() || c == 'X')
        }
        13 => isbn.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };
    if !valid {
        return Err(SharedError::invalid_identifier("Invalid ISBN format"));
    }
    Ok(isbn)
}

/// Normalize a PMID: strip the `pmid:` prefix, require all digits.
fn normalize_pmid(raw: &str) -> Result<String, SharedError> {
    let mut pmid = raw.trim().to_ascii_lowercase();
    if let Some(rest) = pmid.strip_prefix("pmid:") {
        pmid = rest.trim().to_string();
    }
    if pmid.is_empty() || !pmid.chars().all(|c| c.is_ascii_digit()) {
        return Err(SharedError::invalid_identifier("Invalid PMID format"));
    }
    Ok(pmid)
}
