//! HTTP server behaviour on a real socket.

use std::time::Duration;

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use routemirror::config::ListenerConfig;
use routemirror::docs::{self, DocsInfo};

mod common;

#[tokio::test]
async fn test_malformed_json_body() {
    let server = common::spawn_server(common::sample_tree().into_dispatcher()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/users", server.url()))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "error": "Invalid JSON body" })
    );
}

#[tokio::test]
async fn test_body_size_limit() {
    let config = ListenerConfig {
        max_body_bytes: 32,
        ..ListenerConfig::default()
    };
    let server = common::spawn_server_with(common::sample_tree().into_dispatcher(), config).await;

    let response = reqwest::Client::new()
        .post(format!("{}/echo", server.url()))
        .json(&json!({ "padding": "x".repeat(256) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_json_content_type() {
    let server = common::spawn_server(common::sample_tree().into_dispatcher()).await;
    let response = reqwest::get(format!("{}/users/1/posts", server.url()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = common::spawn_server(common::sample_tree().into_dispatcher()).await;
    let url = format!("{}/plain", server.url());
    assert!(reqwest::get(&url).await.unwrap().status().is_success());

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();

    assert!(reqwest::get(&url).await.is_err());
}

#[tokio::test]
async fn test_docs_for_sample_tree() {
    let doc = docs::generate(&common::sample_tree(), &DocsInfo::new("Sample", "0.1.0"));

    let by_id = &doc["paths"]["/users/{id}"];
    assert!(by_id["get"].is_object());
    assert!(by_id["delete"].is_object());
    assert!(doc["paths"]["/users/{id}/posts"]["get"].is_object());
    assert_eq!(
        doc["paths"]["/users"]["post"]["requestBody"]["content"]["application/json"]["schema"]["required"],
        json!(["address", "name"])
    );
}
