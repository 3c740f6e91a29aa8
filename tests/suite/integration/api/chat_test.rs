//! Chat endpoint tests

use axum::http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::test_server;

fn identity(user_id: &'static str, user_name: &'static str) -> [(HeaderName, HeaderValue); 2] {
    [
        (
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static(user_id),
        ),
        (
            HeaderName::from_static("x-user-name"),
            HeaderValue::from_static(user_name),
        ),
    ]
}

async fn post_message(
    server: &axum_test::TestServer,
    user: [(HeaderName, HeaderValue); 2],
    session_id: &str,
    message: &str,
) -> serde_json::Value {
    let [(id_name, id_value), (name_name, name_value)] = user;
    let response = server
        .post("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        .json(&json!({"session_id": session_id, "message": message}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json()
}

#[tokio::test]
async fn test_post_requires_identity() {
    let server = test_server().await;
    let response = server
        .post("/api/chat/messages")
        .json(&json!({"session_id": "doc1", "message": "hello"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_author_is_resolved_from_identity_not_payload() {
    let server = test_server().await;
    let [(id_name, id_value), (name_name, name_value)] = identity("u1", "Ada");
    let response = server
        .post("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        // The payload's claimed author must be ignored
        .json(&json!({
            "session_id": "doc1",
            "message": "hello",
            "user_name": "Mallory",
            "user_id": "u666"
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["userId"], "u1");
    assert_eq!(body["data"]["userName"], "Ada");
    assert!(body["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn test_listing_is_ascending_with_pagination() {
    let server = test_server().await;
    for i in 0..5 {
        post_message(&server, identity("u1", "Ada"), "doc1", &format!("m{i}")).await;
    }

    let response = server
        .get("/api/chat/messages")
        .add_query_param("session_id", "doc1")
        .add_query_param("page", "1")
        .add_query_param("limit", "3")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["total"], 5);

    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    // Ascending within the page, and page 1 holds the newest messages
    let texts: Vec<&str> = messages
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["m2", "m3", "m4"]);
}

#[tokio::test]
async fn test_since_query_is_strictly_newer_and_ascending() {
    let server = test_server().await;
    let mut cursor = String::new();
    for i in 0..4 {
        let body = post_message(&server, identity("u1", "Ada"), "doc1", &format!("m{i}")).await;
        if i == 1 {
            cursor = body["data"]["createdAt"].as_str().unwrap().to_string();
        }
    }

    let response = server
        .get("/api/chat/messages")
        .add_query_param("session_id", "doc1")
        .add_query_param("since", &cursor)
        .await;
    let body: serde_json::Value = response.json();
    let messages = body["data"].as_array().unwrap();

    let texts: Vec<&str> = messages
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["m2", "m3"]);
    let cursor_at: chrono::DateTime<chrono::Utc> = cursor.parse().unwrap();
    for message in messages {
        // Strictly newer than the cursor, never equal
        let created_at: chrono::DateTime<chrono::Utc> =
            message["createdAt"].as_str().unwrap().parse().unwrap();
        assert!(created_at > cursor_at);
    }
    assert!(body.get("pagination").is_none());
}

#[tokio::test]
async fn test_since_poll_at_tail_returns_nothing() {
    let server = test_server().await;
    let body = post_message(&server, identity("u1", "Ada"), "doc1", "only").await;
    let cursor = body["data"]["createdAt"].as_str().unwrap().to_string();

    let response = server
        .get("/api/chat/messages")
        .add_query_param("session_id", "doc1")
        .add_query_param("since", &cursor)
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_by_non_author_is_403_and_keeps_the_row() {
    let server = test_server().await;
    let body = post_message(&server, identity("u1", "Ada"), "doc1", "mine").await;
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let [(id_name, id_value), (name_name, name_value)] = identity("u2", "Mallory");
    let response = server
        .delete("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        .add_query_param("message_id", &message_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // No row deleted
    let response = server
        .get("/api/chat/messages")
        .add_query_param("session_id", "doc1")
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_by_author_succeeds() {
    let server = test_server().await;
    let body = post_message(&server, identity("u1", "Ada"), "doc1", "mine").await;
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let [(id_name, id_value), (name_name, name_value)] = identity("u1", "Ada");
    let response = server
        .delete("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        .add_query_param("message_id", &message_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get("/api/chat/messages")
        .add_query_param("session_id", "doc1")
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_missing_message_is_404() {
    let server = test_server().await;
    let [(id_name, id_value), (name_name, name_value)] = identity("u1", "Ada");
    let response = server
        .delete("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        .add_query_param("message_id", "nope")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let server = test_server().await;
    let [(id_name, id_value), (name_name, name_value)] = identity("u1", "Ada");
    let response = server
        .post("/api/chat/messages")
        .add_header(id_name, id_value)
        .add_header(name_name, name_value)
        .json(&json!({"session_id": "doc1", "message": "   "}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
