//! Batch ingest endpoint tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{doi_batch, test_server};

#[tokio::test]
async fn test_batch_then_resubmit_is_created_then_skipped() {
    let server = test_server().await;
    let body = doi_batch(
        "10.1234/margins.2026",
        json!([{"id": "a1", "type": "highlight", "content": {"text": "x"}}]),
    );

    let first = server.post("/api/annotations").json(&body).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    let first: serde_json::Value = first.json();
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["processedCount"], 1);
    assert_eq!(first["data"]["annotations"][0]["id"], "a1");
    assert_eq!(first["data"]["annotations"][0]["status"], "created");

    let second = server.post("/api/annotations").json(&body).await;
    assert_eq!(second.status_code(), StatusCode::CREATED);
    let second: serde_json::Value = second.json();
    assert_eq!(second["data"]["processedCount"], 0);
    assert_eq!(second["data"]["annotations"][0]["status"], "skipped");
}

#[tokio::test]
async fn test_invalid_doi_is_field_specific_400() {
    let server = test_server().await;
    let body = json!({
        "documentInfo": {
            "identifier": {"type": "doi", "value": "not-a-doi", "normalized": "not-a-doi"},
            "title": "Whatever"
        },
        "annotations": [],
        "source": "test"
    });

    let response = server.post("/api/annotations").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid DOI format");
}

#[tokio::test]
async fn test_missing_fields_fail_the_whole_call() {
    let server = test_server().await;

    let response = server.post("/api/annotations").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Missing documentInfo");

    let response = server
        .post("/api/annotations")
        .json(&json!({"documentInfo": {"title": "T"}, "annotations": []}))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Missing document identifier");

    let response = server
        .post("/api/annotations")
        .json(&json!({
            "documentInfo": {"identifier": {"type": "doi", "value": "10.1/x"}},
            "annotations": []
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Missing document title");

    let response = server
        .post("/api/annotations")
        .json(&json!({
            "documentInfo": {
                "identifier": {"type": "doi", "value": "10.1234/x"},
                "title": "T"
            },
            "annotations": "nope"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "annotations must be an array");
}

#[tokio::test]
async fn test_bad_item_never_blocks_the_rest_of_the_batch() {
    let server = test_server().await;
    let body = doi_batch(
        "10.1234/margins.2026",
        json!([
            {"id": "a1", "type": "highlight", "content": {"text": "x"}},
            {"id": "a2", "type": "highlight", "content": {}},
            {"id": "a3", "type": "note", "content": {"comment": "y"}}
        ]),
    );

    let response = server.post("/api/annotations").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let statuses: Vec<&str> = body["data"]["annotations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["created", "error", "created"]);
    assert_eq!(body["data"]["processedCount"], 2);
}

#[tokio::test]
async fn test_intra_batch_duplicates_resolve_first_created_then_skipped() {
    let server = test_server().await;
    let body = doi_batch(
        "10.1234/margins.2026",
        json!([
            {"id": "a1", "type": "highlight", "content": {"text": "first"}},
            {"id": "a1", "type": "highlight", "content": {"text": "second"}}
        ]),
    );

    let response = server.post("/api/annotations").json(&body).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["annotations"][0]["status"], "created");
    assert_eq!(body["data"]["annotations"][1]["status"], "skipped");
    assert_eq!(
        body["data"]["annotations"][1]["message"],
        "duplicate id in batch"
    );
}

#[tokio::test]
async fn test_doi_forms_converge_on_one_document() {
    let server = test_server().await;

    // Submission requires the bare registry form...
    let body = doi_batch(
        "10.1234/margins.2026",
        json!([{"id": "a1", "type": "highlight", "content": {"text": "x"}}]),
    );
    server.post("/api/annotations").json(&body).await;

    // ...but lookups accept every prefix variant clients hold.
    for doi in [
        "doi:10.1234/margins.2026",
        "https://doi.org/10.1234/margins.2026",
        "dx.doi.org/10.1234/margins.2026",
    ] {
        let response = server.get("/api/annotations").add_query_param("doi", doi).await;
        assert_eq!(response.status_code(), StatusCode::OK, "doi: {doi}");
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["annotations"][0]["id"], "a1");
        assert_eq!(body["data"]["document"]["title"], "A Study of Margins");
    }
}

#[tokio::test]
async fn test_url_form_doi_submission_is_rejected() {
    let server = test_server().await;
    let mut body = doi_batch(
        "10.1234/margins.2026",
        json!([{"id": "a1", "type": "highlight", "content": {"text": "x"}}]),
    );
    // Submitters must normalize to the bare registry form first
    body["documentInfo"]["identifier"]["value"] = json!("https://doi.org/10.1234/margins.2026");

    let response = server.post("/api/annotations").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Invalid DOI format");
}

#[tokio::test]
async fn test_get_unknown_document_is_404() {
    let server = test_server().await;
    let response = server
        .get("/api/annotations")
        .add_query_param("documentId", "doi_10_9999_missing")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/annotations").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_is_scoped_to_one_document() {
    let server = test_server().await;
    for doi in ["10.1234/first", "10.1234/second"] {
        let body = doi_batch(
            doi,
            json!([{"id": "a1", "type": "highlight", "content": {"text": "x"}}]),
        );
        server.post("/api/annotations").json(&body).await;
    }

    // The unscoped form is gone
    let response = server.delete("/api/annotations").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .delete("/api/annotations")
        .add_query_param("documentId", "doi_10_1234_first")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["removed"], 1);

    // The other document is untouched
    let response = server
        .get("/api/annotations")
        .add_query_param("doi", "10.1234/second")
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_explicit_update_bumps_version() {
    let server = test_server().await;
    let body = doi_batch(
        "10.1234/margins.2026",
        json!([{"id": "a1", "type": "highlight", "content": {"text": "original"}}]),
    );
    let response = server.post("/api/annotations").json(&body).await;
    let body: serde_json::Value = response.json();
    let document_id = body["data"]["documentId"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/annotations/{document_id}/a1"))
        .json(&json!({"content": {"text": "revised", "comment": "tightened"}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["status"], "updated");
    assert_eq!(body["data"]["annotation"]["version"], 2);
    assert_eq!(body["data"]["annotation"]["content"]["text"], "revised");

    let response = server
        .put(&format!("/api/annotations/{document_id}/missing"))
        .json(&json!({"content": {"text": "x"}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
