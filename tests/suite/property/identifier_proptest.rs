//! Property-based tests for document identity resolution

use proptest::prelude::*;

use annosync::shared::identifier::{DocumentIdentifier, IdentifierType};

/// Strategy producing well-formed DOIs wrapped in the prefix variants
/// clients actually submit.
fn doi_strategy() -> impl Strategy<Value = String> {
    let prefix = prop::sample::select(vec![
        "",
        "doi:",
        "DOI:",
        "https://doi.org/",
        "http://dx.doi.org/",
        "dx.doi.org/",
    ]);
    let registrant = "[0-9]{4,8}";
    let suffix = "[a-zA-Z0-9._()-]{1,24}";
    (prefix, registrant, suffix)
        .prop_map(|(prefix, registrant, suffix)| format!("{prefix}10.{registrant}/{suffix}"))
}

proptest! {
    #[test]
    fn test_normalize_is_idempotent(raw in doi_strategy()) {
        let first = DocumentIdentifier::new(IdentifierType::Doi, raw.clone())
            .normalize()
            .unwrap();
        let second = DocumentIdentifier::new(IdentifierType::Doi, first.clone())
            .normalize()
            .unwrap();
        prop_assert_eq!(first, second, "raw: {}", raw);
    }

    #[test]
    fn test_valid_dois_always_normalize(raw in doi_strategy()) {
        let id = DocumentIdentifier::new(IdentifierType::Doi, raw);
        prop_assert!(id.normalize().is_ok());
    }

    #[test]
    fn test_document_id_is_deterministic(raw in doi_strategy()) {
        let a = DocumentIdentifier::new(IdentifierType::Doi, raw.clone())
            .document_id()
            .unwrap();
        let b = DocumentIdentifier::new(IdentifierType::Doi, raw)
            .document_id()
            .unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert!(a.starts_with("doi_10_"));
    }

    #[test]
    fn test_document_id_has_no_separator_chars(raw in doi_strategy()) {
        let id = DocumentIdentifier::new(IdentifierType::Doi, raw)
            .document_id()
            .unwrap();
        // Everything after the type tag is flattened to [a-z0-9_]
        let suffix = id.strip_prefix("doi_").unwrap();
        prop_assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_prefix_variants_converge(registrant in "[0-9]{4,8}", suffix in "[a-z0-9._-]{1,24}") {
        let bare = format!("10.{registrant}/{suffix}");
        let bare_id = DocumentIdentifier::new(IdentifierType::Doi, bare.clone())
            .document_id()
            .unwrap();
        for wrapped in [
            format!("doi:{bare}"),
            format!("https://doi.org/{bare}"),
            format!("dx.doi.org/{bare}"),
        ] {
            let wrapped_id = DocumentIdentifier::new(IdentifierType::Doi, wrapped)
                .document_id()
                .unwrap();
            prop_assert_eq!(&bare_id, &wrapped_id);
        }
    }
}
