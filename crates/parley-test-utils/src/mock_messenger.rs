// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging provider for deterministic testing.
//!
//! `MockMessenger` implements `MessagingProvider` over in-memory maps.
//! Tests script what the provider knows (messages by id, chat history,
//! contacts, media) and assert on what was sent or deleted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use parley_core::traits::{MessagingProvider, PluginAdapter};
use parley_core::types::{AdapterType, ChatSummary, ContactInfo, HealthStatus, MediaPayload};
use parley_core::{ParleyError, ProviderEvent};

/// A text handed to [`MessagingProvider::send_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub jid: String,
    pub text: String,
    /// Id returned to the caller.
    pub id: String,
}

#[derive(Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<SentText>>,
    deleted: Mutex<Vec<(String, String, bool)>>,
    by_id: Mutex<HashMap<String, ProviderEvent>>,
    history: Mutex<HashMap<String, Vec<ProviderEvent>>>,
    chats: Mutex<Vec<ChatSummary>>,
    contacts: Mutex<HashMap<String, ContactInfo>>,
    media: Mutex<HashMap<String, MediaPayload>>,
    fail_sends: AtomicBool,
    fail_history: AtomicBool,
    history_delay_ms: AtomicU64,
    health: Mutex<Option<HealthStatus>>,
    shutdowns: AtomicUsize,
    send_counter: AtomicUsize,
    history_calls: AtomicUsize,
    lookups: AtomicUsize,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `event` retrievable through `get_message_by_id`.
    pub async fn add_message(&self, event: Value) {
        let event = ProviderEvent::new(event);
        if let Some(id) = event.id() {
            let id = id.to_string();
            self.by_id.lock().await.insert(id, event);
        }
    }

    /// Appends `event` to the history of chat `jid`.
    pub async fn push_history(&self, jid: &str, event: Value) {
        self.history
            .lock()
            .await
            .entry(jid.to_string())
            .or_default()
            .push(ProviderEvent::new(event));
    }

    pub async fn add_chat(&self, jid: &str, is_group: bool) {
        self.chats.lock().await.push(ChatSummary {
            id: jid.to_string(),
            name: None,
            is_group,
        });
    }

    pub async fn add_contact(&self, jid: &str, name: &str, profile_pic_url: Option<&str>) {
        self.contacts.lock().await.insert(
            jid.to_string(),
            ContactInfo {
                name: Some(name.to_string()),
                profile_pic_url: profile_pic_url.map(str::to_string),
            },
        );
    }

    pub async fn add_media(&self, message_id: &str, payload: MediaPayload) {
        self.media
            .lock()
            .await
            .insert(message_id.to_string(), payload);
    }

    /// Makes every subsequent `send_text` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent history fetch fail.
    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Overrides the status reported by `health_check`.
    pub async fn set_health(&self, status: HealthStatus) {
        *self.health.lock().await = Some(status);
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Every subsequent history fetch sleeps for `delay` first.
    pub fn delay_history(&self, delay: Duration) {
        self.history_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|s| s.text.clone()).collect()
    }

    /// `(jid, message id, for everyone)` per delete request.
    pub async fn deleted(&self) -> Vec<(String, String, bool)> {
        self.deleted.lock().await.clone()
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn contact_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockMessenger {
    fn name(&self) -> &str {
        "mock-messenger"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self
            .health
            .lock()
            .await
            .clone()
            .unwrap_or(HealthStatus::Healthy))
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl MessagingProvider for MockMessenger {
    async fn send_text(&self, jid: &str, text: &str) -> Result<Option<String>, ParleyError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ParleyError::messaging("mock send failure"));
        }
        let n = self.send_counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("true_{jid}_MOCK{n}");
        self.sent.lock().await.push(SentText {
            jid: jid.to_string(),
            text: text.to_string(),
            id: id.clone(),
        });
        Ok(Some(id))
    }

    async fn download_media(&self, message_id: &str) -> Result<MediaPayload, ParleyError> {
        self.media
            .lock()
            .await
            .get(message_id)
            .cloned()
            .ok_or_else(|| ParleyError::messaging(format!("no media for {message_id}")))
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Option<ProviderEvent>, ParleyError> {
        Ok(self.by_id.lock().await.get(id).cloned())
    }

    async fn get_all_messages_in_chat(
        &self,
        jid: &str,
        include_me: bool,
        limit: usize,
    ) -> Result<Vec<ProviderEvent>, ParleyError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.history_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(ParleyError::messaging("mock history failure"));
        }
        let history = self.history.lock().await;
        let events: Vec<ProviderEvent> = history
            .get(jid)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| include_me || !e.from_me())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }

    async fn get_all_chats(&self) -> Result<Vec<ChatSummary>, ParleyError> {
        Ok(self.chats.lock().await.clone())
    }

    async fn get_contact(&self, jid: &str) -> Result<Option<ContactInfo>, ParleyError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.contacts.lock().await.get(jid).cloned())
    }

    async fn get_profile_pic(&self, jid: &str) -> Result<Option<String>, ParleyError> {
        Ok(self
            .contacts
            .lock()
            .await
            .get(jid)
            .and_then(|c| c.profile_pic_url.clone()))
    }

    async fn delete_message(
        &self,
        jid: &str,
        message_id: &str,
        for_everyone: bool,
    ) -> Result<(), ParleyError> {
        self.deleted
            .lock()
            .await
            .push((jid.to_string(), message_id.to_string(), for_everyone));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn send_records_and_names_messages() {
        let mock = MockMessenger::new();
        let id = mock.send_text("911@c.us", "hello").await.unwrap().unwrap();
        assert_eq!(id, "true_911@c.us_MOCK0");
        assert_eq!(mock.sent_texts().await, vec!["hello"]);
    }

    #[tokio::test]
    async fn send_failure_toggle() {
        let mock = MockMessenger::new();
        mock.fail_sends(true);
        assert!(mock.send_text("911@c.us", "hello").await.is_err());
        assert!(mock.sent().await.is_empty());
    }

    #[tokio::test]
    async fn history_respects_include_me_and_limit() {
        let mock = MockMessenger::new();
        for (i, from_me) in [(1, true), (2, false), (3, true)] {
            mock.push_history("911@c.us", json!({ "id": format!("m{i}"), "fromMe": from_me }))
                .await;
        }

        let others = mock.get_all_messages_in_chat("911@c.us", false, 10).await.unwrap();
        assert_eq!(others.len(), 1);

        let last_two = mock.get_all_messages_in_chat("911@c.us", true, 2).await.unwrap();
        assert_eq!(last_two[0].id(), Some("m2"));
        assert_eq!(last_two[1].id(), Some("m3"));
        assert_eq!(mock.history_calls(), 2);
    }
}
