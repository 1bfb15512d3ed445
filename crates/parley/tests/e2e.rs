// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across the gateway, the agent and the stores.
//!
//! Each test creates an isolated TestHarness with temp JSON stores and mock
//! adapters, then drives it through the HTTP router. Tests are independent
//! and order-insensitive.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use parley_core::{ChatMode, ViewerEvent};
use parley_gateway::{router, GatewayState};
use parley_storage::{ModeRegistry, TranscriptStore};
use parley_test_utils::TestHarness;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "e2e-token";
const PEER: &str = "919812345678";
const PEER_JID: &str = "919812345678@c.us";

fn request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn inbound(id: &str, body: &str, t: i64) -> Value {
    json!({
        "id": id, "from": PEER_JID, "to": "910000000000@c.us",
        "t": t, "fromMe": false, "type": "chat", "body": body
    })
}

async fn wait_for<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ---- Autonomous conversation over the webhook ----

#[tokio::test]
async fn autonomous_reply_round_trip() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["Will call you back".to_string()])
        .with_config(|c| c.assistant.identity_line = String::new())
        .build()
        .await
        .unwrap();
    let app = router(GatewayState::new(h.agent.clone(), Some(TOKEN.into())));
    let mut viewer = h.agent.fanout().subscribe();

    let mode = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/v1/conversations/{PEER}/mode"),
            json!({ "mode": "autonomous" }),
        ))
        .await
        .unwrap();
    assert_eq!(mode.status(), StatusCode::OK);

    let accepted = app
        .oneshot(request(
            "POST",
            "/v1/provider/events",
            inbound("IN1", "are you free?", h.unix_now()),
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);

    wait_for("the autonomous reply", || async {
        h.messages(PEER).await.len() == 2
    })
    .await;

    let sent = h.messenger.sent_texts().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Good morning!"));
    assert!(sent[0].ends_with("Will call you back"));

    // Viewers see the inbound message before the reply.
    let mut contents = Vec::new();
    for _ in 0..2 {
        if let ViewerEvent::Message(event) = viewer.recv().await.unwrap() {
            contents.push(event.content);
        }
    }
    assert_eq!(contents[0], "are you free?");
    assert_eq!(contents[1], sent[0]);
}

// ---- Duplicate webhook deliveries ----

#[tokio::test]
async fn duplicate_webhook_deliveries_store_once() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = router(GatewayState::new(h.agent.clone(), Some(TOKEN.into())));
    let event = inbound("IN1", "hello", h.unix_now());

    let response = app
        .oneshot(request("POST", "/v1/provider/events", json!([event.clone(), event])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    wait_for("the stored message", || async { !h.messages(PEER).await.is_empty() }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.messages(PEER).await.len(), 1);
}

// ---- Assisted send through the REST API ----

#[tokio::test]
async fn assisted_send_stores_original_and_rewrite() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["I will reach by 5 pm.".to_string()])
        .build()
        .await
        .unwrap();
    h.set_mode(PEER, ChatMode::Assisted).await;
    let app = router(GatewayState::new(h.agent.clone(), Some(TOKEN.into())));

    let response = app
        .oneshot(request(
            "POST",
            &format!("/v1/conversations/{PEER}/messages"),
            json!({ "text": "will reach by 5" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.messenger.sent_texts().await, vec!["I will reach by 5 pm."]);
    let transcript = h.messages(PEER).await;
    assert_eq!(transcript.len(), 2);
    assert!(transcript[0].is_assisted_original);
    assert!(transcript[1].is_assisted_rewrite);
}

// ---- State survives a restart ----

#[tokio::test]
async fn modes_and_transcript_survive_reopen() {
    let h = TestHarness::builder().build().await.unwrap();
    h.set_mode(PEER, ChatMode::Autonomous).await;
    h.send(PEER, "see you").await.unwrap();

    let store = TranscriptStore::open(h.config.storage.transcript_path()).await;
    let modes = ModeRegistry::open(h.config.storage.modes_path()).await;

    let transcript = store.messages(PEER).await;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].content, "see you");
    assert_eq!(modes.mode(PEER).await, ChatMode::Autonomous);
}

// ---- Configuration from a file ----

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(
        &path,
        "[gateway]\nport = 9911\nbearer_token = \"file-token\"\n\n[sync]\nenabled = false\n",
    )
    .unwrap();

    let config = parley_config::load_and_validate_path(&path).unwrap();
    assert_eq!(config.gateway.port, 9911);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("file-token"));
    assert!(!config.sync.enabled);
}
