//! Integration tests for the presentation-facing API server.
//!
//! The server runs against the in-process mock backend.

mod common;

use common::{authenticated_mock, spawn_mock};
use meetsync::api::ApiServer;
use meetsync::backend::HttpBackend;
use meetsync::config::Config;
use meetsync::engine::Engine;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_api() -> String {
    let backend_url = spawn_mock(authenticated_mock()).await;

    let mut config = Config::default();
    config.backend.base_url = backend_url.clone();
    config.sync.verify_attempts = 1;
    config.sync.settle_delay_ms = 100;
    let backend = HttpBackend::new(&backend_url, "zoom", Duration::from_secs(5)).unwrap();
    let engine = Arc::new(Engine::new(Arc::new(backend), &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ApiServer::new(engine, &config);
    tokio::spawn(async move {
        server.serve(listener).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_service_info() {
    let api = spawn_api().await;
    let body: Value = reqwest::get(format!("{api}/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["service"], "meetsync");
}

#[tokio::test]
async fn test_catalog_then_sync() {
    let api = spawn_api().await;
    let client = reqwest::Client::new();

    let catalog: Value = client
        .get(format!("{api}/catalog/past"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog["status"], "results");
    assert_eq!(catalog["meetings"][0]["remote_id"], "42");

    let response = client
        .post(format!("{api}/meetings/42/sync"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["meeting"]["meeting_id"], "42");

    let stats: Value = client
        .get(format!("{api}/meetings/42/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_participants"], 0);
    assert!(stats["avg_duration_seconds"].is_null());
}

#[tokio::test]
async fn test_error_responses() {
    let api = spawn_api().await;
    let client = reqwest::Client::new();

    let unknown_category = client
        .get(format!("{api}/catalog/archived"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_category.status(), 400);

    let missing = client
        .get(format!("{api}/meetings/77"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], true);
    assert_eq!(body["reload_required"], false);

    let upstream = client
        .post(format!("{api}/meetings/404/sync"))
        .send()
        .await
        .unwrap();
    assert_eq!(upstream.status(), 502);
    let body: Value = upstream.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Meeting 404 not found. Make sure the meeting exists."
    );
}

#[tokio::test]
async fn test_disconnect_requires_confirmation() {
    let api = spawn_api().await;
    let client = reqwest::Client::new();

    let refused = client
        .post(format!("{api}/session/disconnect"))
        .json(&json!({ "confirm": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), 400);

    let accepted = client
        .post(format!("{api}/session/disconnect"))
        .json(&json!({ "confirm": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);

    let session: Value = client
        .get(format!("{api}/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["session"]["authenticated"], false);
}

/// Read the event stream until `name` shows up or the deadline passes.
async fn wait_for_event(response: &mut reqwest::Response, name: &str) -> String {
    let mut seen = String::new();
    let deadline = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = response.chunk().await.unwrap() {
            seen.push_str(&String::from_utf8_lossy(&chunk));
            if seen.contains(&format!("event: {name}")) {
                return;
            }
        }
    });
    deadline.await.expect("event did not arrive in time");
    seen
}

#[tokio::test]
async fn test_event_stream_reports_sync_and_disconnect() {
    let api = spawn_api().await;
    let client = reqwest::Client::new();

    let mut events = client.get(format!("{api}/events")).send().await.unwrap();
    assert_eq!(events.status(), 200);
    assert!(events.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let synced = client
        .post(format!("{api}/meetings/42/sync"))
        .send()
        .await
        .unwrap();
    assert_eq!(synced.status(), 200);
    let seen = wait_for_event(&mut events, "meeting_synced").await;
    assert!(seen.contains(r#""remote_id":"42""#));

    client
        .post(format!("{api}/session/disconnect"))
        .json(&json!({ "confirm": true }))
        .send()
        .await
        .unwrap();
    wait_for_event(&mut events, "session_invalidated").await;
}

