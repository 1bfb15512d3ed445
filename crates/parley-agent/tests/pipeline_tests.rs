// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end behavior of ingestion and mode dispatch over mock adapters.

use std::time::Duration;

use parley_core::types::MediaPayload;
use parley_core::{ChatMode, Direction, HealthStatus, MessageKind, ViewerEvent};
use parley_test_utils::TestHarness;
use serde_json::{json, Value};

const PEER: &str = "919812345678";
const PEER_JID: &str = "919812345678@c.us";
const BOT_JID: &str = "867051314767696@bot";

fn inbound(id: &str, body: &str, t: i64) -> Value {
    json!({
        "id": id,
        "from": PEER_JID,
        "to": "910000000000@c.us",
        "t": t,
        "fromMe": false,
        "type": "chat",
        "body": body
    })
}

#[tokio::test]
async fn received_message_in_assisted_mode_is_stored_unmodified() {
    let h = TestHarness::builder().build().await.unwrap();
    h.set_mode(PEER, ChatMode::Assisted).await;

    let stored = h.receive(inbound("A1", "kal milte hai", h.unix_now())).await.unwrap();

    assert_eq!(stored.content, "kal milte hai");
    assert_eq!(stored.direction, Direction::Received);
    assert_eq!(h.messages(PEER).await.len(), 1);
    assert_eq!(h.completion.call_count().await, 0);
    assert!(h.messenger.sent().await.is_empty());
}

#[tokio::test]
async fn assisted_send_translates_and_stores_both_records() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["I am fine".into()])
        .build()
        .await
        .unwrap();
    h.set_mode(PEER, ChatMode::Assisted).await;

    let stored = h.send(PEER, "mai theek hu").await.unwrap();

    assert_eq!(stored.len(), 2);
    assert!(stored[0].is_assisted_original);
    assert_eq!(stored[0].content, "mai theek hu");
    assert!(stored[1].is_assisted_rewrite);
    assert_eq!(stored[1].content, "I am fine");
    assert_eq!(h.messenger.sent_texts().await, vec!["I am fine"]);

    let requests = h.completion.requests().await;
    assert!(requests[0].system_instruction.contains("Translate"));
    assert_eq!(h.messages(PEER).await.len(), 2);
}

#[tokio::test]
async fn assisted_send_keeps_original_when_rewrite_is_rejected() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["Here is the corrected version of your message: see you soon".into()])
        .build()
        .await
        .unwrap();
    h.set_mode(PEER, ChatMode::Assisted).await;

    let stored = h.send(PEER, "see u soon").await.unwrap();

    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_assisted_original);
    assert_eq!(h.messenger.sent_texts().await, vec!["see u soon"]);
}

#[tokio::test]
async fn near_duplicate_within_window_is_rejected() {
    let h = TestHarness::builder().build().await.unwrap();
    let t = h.unix_now();

    assert!(h.receive(inbound("A1", "hello", t)).await.is_some());
    assert!(h.receive(inbound("A2", "hello", t + 3)).await.is_none());
    assert_eq!(h.messages(PEER).await.len(), 1);
}

#[tokio::test]
async fn repeat_after_window_is_accepted() {
    let h = TestHarness::builder().build().await.unwrap();
    let t = h.unix_now();

    assert!(h.receive(inbound("A1", "hello", t)).await.is_some());
    assert!(h.receive(inbound("A2", "hello", t + 9)).await.is_some());
    assert_eq!(h.messages(PEER).await.len(), 2);
}

#[tokio::test]
async fn same_id_is_stored_once() {
    let h = TestHarness::builder().build().await.unwrap();
    let t = h.unix_now();

    assert!(h.receive(inbound("A1", "hello", t)).await.is_some());
    assert!(h.receive(inbound("A1", "hello", t + 60)).await.is_none());
}

#[tokio::test]
async fn schedule_shapes_the_instruction() {
    let h = TestHarness::builder()
        .at("2025-01-06T10:30:00+00:00")
        .build()
        .await
        .unwrap();
    h.agent
        .registry
        .set_assistant(Some("Reply like me.".into()), Some("09:00-12:00: Coding".into()))
        .await;

    let instruction = h.agent.dispatcher.current_instruction().await;

    assert!(instruction.starts_with("Reply like me."));
    assert!(instruction.contains("Coding"));
    assert!(instruction.contains("The user is busy"));
}

#[tokio::test]
async fn delete_falls_back_to_id_suffix() {
    let h = TestHarness::builder().build().await.unwrap();
    h.receive(inbound("msg_456_abc", "to be removed", h.unix_now())).await.unwrap();
    let mut viewer = h.agent.fanout().subscribe();

    let removed = h.agent.delete_message(PEER, "msg_123_abc", false).await.unwrap();

    assert_eq!(removed.id, "msg_456_abc");
    assert!(h.messages(PEER).await.is_empty());
    assert_eq!(
        viewer.recv().await.unwrap(),
        ViewerEvent::MessageDeleted {
            from: PEER.into(),
            id: "msg_456_abc".into()
        }
    );
    assert!(h.messenger.deleted().await.is_empty());
}

#[tokio::test]
async fn delete_for_everyone_reaches_the_provider() {
    let h = TestHarness::builder().build().await.unwrap();
    h.receive(inbound("false_919812345678@c.us_XYZ", "oops", h.unix_now()))
        .await
        .unwrap();

    h.agent.delete_message(PEER, "XYZ", true).await.unwrap();

    assert_eq!(
        h.messenger.deleted().await,
        vec![(PEER_JID.to_string(), "false_919812345678@c.us_XYZ".to_string(), true)]
    );
}

#[tokio::test]
async fn delete_conversation_keeps_mode() {
    let h = TestHarness::builder().build().await.unwrap();
    h.set_mode(PEER, ChatMode::Assisted).await;
    h.receive(inbound("A1", "hi", h.unix_now())).await.unwrap();
    let mut viewer = h.agent.fanout().subscribe();

    assert!(h.agent.delete_conversation(PEER).await);
    assert!(!h.agent.delete_conversation(PEER).await);

    assert!(h.messages(PEER).await.is_empty());
    assert_eq!(h.agent.registry.mode(PEER).await, ChatMode::Assisted);
    assert_eq!(
        viewer.recv().await.unwrap(),
        ViewerEvent::ConversationDeleted { from: PEER.into() }
    );
}

#[tokio::test]
async fn autonomous_reply_greets_only_fresh_exchanges() {
    let h = TestHarness::builder()
        .with_mock_responses(vec![
            "I am coding right now, will call you back".into(),
            "Sure".into(),
        ])
        .with_config(|c| c.assistant.identity_line = "This is Asha's assistant.".into())
        .build()
        .await
        .unwrap();
    h.set_mode(PEER, ChatMode::Autonomous).await;

    h.receive(inbound("A1", "are you free?", h.unix_now())).await.unwrap();
    h.clock.advance(chrono::Duration::seconds(60));
    h.receive(inbound("A2", "ok call me later", h.unix_now())).await.unwrap();

    let sent = h.messenger.sent_texts().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0],
        "Good morning! This is Asha's assistant. I am coding right now, will call you back"
    );
    assert_eq!(sent[1], "Sure");

    let transcript = h.messages(PEER).await;
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[1].direction, Direction::Sent);
}

#[tokio::test]
async fn autonomous_reply_is_truncated() {
    let long: Vec<String> = (1..=30).map(|i| format!("w{i}")).collect();
    let h = TestHarness::builder()
        .with_mock_responses(vec![long.join(" ")])
        .with_config(|c| c.assistant.identity_line = String::new())
        .build()
        .await
        .unwrap();
    h.set_mode(PEER, ChatMode::Autonomous).await;

    h.receive(inbound("A1", "tell me everything", h.unix_now())).await.unwrap();

    let sent = h.messenger.sent_texts().await;
    assert!(sent[0].ends_with("w25..."));
    assert!(!sent[0].contains("w26"));
}

#[tokio::test]
async fn autonomous_ignores_own_and_media_messages() {
    let h = TestHarness::builder().build().await.unwrap();
    h.set_mode(PEER, ChatMode::Autonomous).await;
    h.messenger
        .add_media("IMG1", MediaPayload::Bytes(vec![0xff, 0xd8, 0xff]))
        .await;

    h.receive(json!({
        "id": "IMG1", "from": PEER_JID, "t": h.unix_now(), "fromMe": false,
        "type": "image", "hasMedia": true, "mimetype": "image/jpeg"
    }))
    .await
    .unwrap();
    h.receive(json!({
        "id": "S1", "from": "910000000000@c.us", "to": PEER_JID,
        "t": h.unix_now(), "fromMe": true, "body": "my own words"
    }))
    .await
    .unwrap();

    assert_eq!(h.completion.call_count().await, 0);
    assert!(h.messenger.sent().await.is_empty());
}

#[tokio::test]
async fn llm_timeout_degrades_per_mode() {
    let h = TestHarness::builder()
        .with_llm_delay(Duration::from_secs(3))
        .with_config(|c| c.llm.timeout_secs = 1)
        .build()
        .await
        .unwrap();

    h.set_mode(PEER, ChatMode::Autonomous).await;
    h.receive(inbound("A1", "hello?", h.unix_now())).await.unwrap();
    assert!(h.messenger.sent().await.is_empty());

    h.set_mode(PEER, ChatMode::Assisted).await;
    let stored = h.send(PEER, "mai aa raha hu").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(h.messenger.sent_texts().await, vec!["mai aa raha hu"]);
}

#[tokio::test]
async fn llm_failure_keeps_autonomous_silent() {
    let h = TestHarness::builder().build().await.unwrap();
    h.completion.add_failure("overloaded").await;
    h.set_mode(PEER, ChatMode::Autonomous).await;

    assert!(h.receive(inbound("A1", "ping", h.unix_now())).await.is_some());
    assert!(h.messenger.sent().await.is_empty());
    assert_eq!(h.messages(PEER).await.len(), 1);
}

#[tokio::test]
async fn failed_send_still_records_optimistically() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger.fail_sends(true);

    let stored = h.send(PEER, "are you there").await.unwrap();

    assert_eq!(stored.len(), 1);
    assert!(stored[0].id.starts_with("local_"));
    assert_eq!(stored[0].direction, Direction::Sent);
}

#[tokio::test]
async fn empty_send_is_refused() {
    let h = TestHarness::builder().build().await.unwrap();
    assert!(h.send(PEER, "   ").await.is_err());
    assert!(h.messenger.sent().await.is_empty());
}

#[tokio::test]
async fn provider_echo_of_manual_send_is_dropped() {
    let h = TestHarness::builder().build().await.unwrap();
    let stored = h.send(PEER, "on my way").await.unwrap();
    let id = stored[0].id.clone();

    let echo = h
        .receive(json!({
            "id": id, "from": "910000000000@c.us", "to": PEER_JID,
            "t": h.unix_now(), "fromMe": true, "body": "on my way"
        }))
        .await;

    assert!(echo.is_none());
    assert_eq!(h.messages(PEER).await.len(), 1);
}

#[tokio::test]
async fn group_and_status_events_are_ignored() {
    let h = TestHarness::builder().build().await.unwrap();
    let t = h.unix_now();

    assert!(h
        .receive(json!({ "id": "G1", "from": "12345@g.us", "t": t, "body": "group chatter" }))
        .await
        .is_none());
    assert!(h
        .receive(json!({ "id": "S1", "from": PEER_JID, "isStatus": true, "t": t, "body": "story" }))
        .await
        .is_none());
    assert!(h.agent.store.conversation_ids().await.is_empty());
}

#[tokio::test]
async fn failed_media_download_stores_placeholder() {
    let h = TestHarness::builder().build().await.unwrap();

    let stored = h
        .receive(json!({
            "id": "V1", "from": PEER_JID, "t": h.unix_now(),
            "type": "video", "hasMedia": true
        }))
        .await
        .unwrap();

    assert_eq!(stored.kind, MessageKind::Chat);
    assert_eq!(stored.content, "[Error processing media]");
}

#[tokio::test]
async fn voice_note_is_stored_as_audio() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .add_media("P1", MediaPayload::Encoded("data:audio/ogg;base64,T2dnUw==".into()))
        .await;

    let stored = h
        .receive(json!({
            "id": "P1", "from": PEER_JID, "t": h.unix_now(),
            "type": "ptt", "mimetype": "audio/ogg; codecs=opus"
        }))
        .await
        .unwrap();

    assert_eq!(stored.kind, MessageKind::Audio);
    assert_eq!(stored.content, "T2dnUw==");
    assert_eq!(stored.mime_type.as_deref(), Some("audio/ogg; codecs=opus"));
}

#[tokio::test]
async fn short_bot_placeholder_is_replaced_by_refetched_text() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .add_message(json!({
            "id": "B1", "from": PEER_JID,
            "body": "The weather in Pune is sunny with a high of 31 degrees."
        }))
        .await;

    let stored = h
        .receive(json!({
            "id": "B1", "from": PEER_JID, "t": h.unix_now(),
            "body": "...", "invokedBotWid": "867051314767696@bot"
        }))
        .await
        .unwrap();

    assert!(stored.content.starts_with("The weather in Pune"));
}

#[tokio::test]
async fn bot_scan_prefers_real_reply_over_own_placeholder() {
    let h = TestHarness::builder().build().await.unwrap();
    let t = h.unix_now();
    h.messenger
        .push_history(BOT_JID, json!({ "id": "P1", "from": BOT_JID, "t": t, "body": "..." }))
        .await;
    h.messenger
        .push_history(
            BOT_JID,
            json!({
                "id": "R9", "from": BOT_JID, "t": t + 1,
                "body": "The weather in Pune is sunny with a high of 31 degrees."
            }),
        )
        .await;

    let stored = h
        .receive(json!({
            "id": "P1", "from": BOT_JID, "t": t,
            "body": "...", "invokedBotWid": BOT_JID
        }))
        .await
        .unwrap();

    assert_eq!(
        stored.content,
        "The weather in Pune is sunny with a high of 31 degrees."
    );
}

#[tokio::test]
async fn bot_scan_skipped_for_senders_off_the_whitelist() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .push_history(
            PEER_JID,
            json!({ "id": "R1", "from": PEER_JID, "t": h.unix_now(), "body": "a much longer nearby message" }),
        )
        .await;
    let stored = h
        .receive(json!({
            "id": "P2", "from": PEER_JID, "t": h.unix_now(),
            "body": "...", "invokedBotWid": BOT_JID
        }))
        .await
        .unwrap();

    assert_eq!(stored.content, "...");
}

#[tokio::test]
async fn parent_reference_is_chased_through_composite_ids() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .add_message(json!({
            "id": format!("true_{PEER_JID}_3EB0PARENT"),
            "from": "910000000000@c.us", "to": PEER_JID,
            "body": "Meeting moved to Thursday at four."
        }))
        .await;

    let stored = h
        .receive(json!({
            "id": "C1", "from": PEER_JID, "to": "910000000000@c.us",
            "t": h.unix_now(), "body": "ok", "parentMsgId": "3EB0PARENT"
        }))
        .await
        .unwrap();

    assert_eq!(stored.content, "Meeting moved to Thursday at four.");
    assert_eq!(stored.id, "C1");
}

#[tokio::test]
async fn viewers_see_messages_in_acceptance_order_with_contact() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .add_contact(PEER_JID, "Ravi", Some("https://cdn.example/ravi.jpg"))
        .await;
    let mut viewer = h.agent.fanout().subscribe();
    let t = h.unix_now();

    h.receive(inbound("A1", "first", t)).await.unwrap();
    h.receive(inbound("A2", "second", t + 1)).await.unwrap();

    for expected in ["first", "second"] {
        match viewer.recv().await.unwrap() {
            ViewerEvent::Message(event) => {
                assert_eq!(event.content, expected);
                assert_eq!(event.from, PEER);
                assert_eq!(event.contact_name.as_deref(), Some("Ravi"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(h.messenger.contact_lookups(), 1);
}

#[tokio::test]
async fn shutdown_reaches_the_provider() {
    let h = TestHarness::builder().build().await.unwrap();
    h.agent.shutdown().await;
    assert_eq!(h.messenger.shutdown_calls(), 1);
}

#[tokio::test]
async fn health_lists_both_adapters() {
    let h = TestHarness::builder().build().await.unwrap();
    h.messenger
        .set_health(HealthStatus::Degraded("slow sidecar".into()))
        .await;

    let health = h.agent.health().await;

    assert_eq!(health.len(), 2);
    assert_eq!(health[0].name, "mock-messenger");
    assert_eq!(health[0].status, "degraded");
    assert_eq!(health[0].detail.as_deref(), Some("slow sidecar"));
    assert!(health[1].is_healthy());
}
