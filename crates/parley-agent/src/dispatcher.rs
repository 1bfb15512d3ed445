// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation mode behavior.
//!
//! Outbound sends enter through [`Dispatcher::send`]; accepted inbound
//! messages are offered to [`Dispatcher::on_received`]. Neither ever fails
//! because of the LLM: a failed or slow completion degrades to sending the
//! original text (Assisted) or to sending nothing (Autonomous).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_config::ParleyConfig;
use parley_core::jid::to_chat_jid;
use parley_core::types::{format_timestamp, CompletionRequest};
use parley_core::{
    ChatMode, CompletionProvider, Direction, Message, MessageKind, MessagingProvider, ParleyError,
};
use parley_storage::ModeRegistry;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::commit::Committer;
use crate::contacts::ContactCache;
use crate::reply::{compose_reply, greeting, is_fresh_exchange, truncate_words};
use crate::rewrite::{accept_rewrite, instruction_for};
use crate::schedule::build_instruction;

/// Synthetic id for messages the provider has not (yet) named.
pub fn local_message_id() -> String {
    format!("local_{}", Uuid::new_v4())
}

/// Assistant tuning taken from configuration.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub default_instruction: String,
    pub identity_line: String,
    pub greeting_gap_secs: u64,
    pub max_reply_words: usize,
    pub llm_timeout: Duration,
}

impl DispatcherSettings {
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self {
            default_instruction: config.assistant.default_instruction.clone(),
            identity_line: config.assistant.identity_line.clone(),
            greeting_gap_secs: config.assistant.greeting_gap_secs,
            max_reply_words: config.assistant.max_reply_words,
            llm_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

pub struct Dispatcher {
    provider: Arc<dyn MessagingProvider>,
    completer: Arc<dyn CompletionProvider>,
    committer: Arc<Committer>,
    registry: Arc<ModeRegistry>,
    contacts: Arc<ContactCache>,
    clock: Arc<dyn Clock>,
    settings: DispatcherSettings,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        completer: Arc<dyn CompletionProvider>,
        committer: Arc<Committer>,
        registry: Arc<ModeRegistry>,
        contacts: Arc<ContactCache>,
        clock: Arc<dyn Clock>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            provider,
            completer,
            committer,
            registry,
            contacts,
            clock,
            settings,
        }
    }

    /// Sends user-typed `text` to `conversation` according to its mode.
    ///
    /// Returns the records that were stored, in order.
    pub async fn send(&self, conversation: &str, text: &str) -> Result<Vec<Message>, ParleyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParleyError::messaging("cannot send an empty message"));
        }

        match self.registry.mode(conversation).await {
            ChatMode::Assisted => Ok(self.send_assisted(conversation, text).await),
            ChatMode::Manual | ChatMode::Autonomous => {
                let id = self.deliver(conversation, text).await;
                let message = Message::chat(id, text, Direction::Sent, self.stamp());
                Ok(self.store(conversation, message).await.into_iter().collect())
            }
        }
    }

    async fn send_assisted(&self, conversation: &str, text: &str) -> Vec<Message> {
        let mut stored = Vec::with_capacity(2);

        let mut original = Message::chat(local_message_id(), text, Direction::Sent, self.stamp());
        original.is_assisted_original = true;
        stored.extend(self.store(conversation, original).await);

        let rewrite = self.rewrite(text).await;
        let outgoing = rewrite.as_deref().unwrap_or(text);
        let id = self.deliver(conversation, outgoing).await;

        if let Some(rewrite) = rewrite {
            let mut record = Message::chat(id, rewrite, Direction::Sent, self.stamp());
            record.is_assisted_rewrite = true;
            stored.extend(self.store(conversation, record).await);
        }
        stored
    }

    async fn rewrite(&self, text: &str) -> Option<String> {
        let request = CompletionRequest {
            user_text: text.to_string(),
            system_instruction: instruction_for(text).to_string(),
        };
        match self.complete(request).await {
            Ok(candidate) => {
                let accepted = accept_rewrite(text, &candidate);
                if accepted.is_none() {
                    debug!(candidate_len = candidate.len(), "rewrite discarded, sending original");
                }
                accepted
            }
            Err(e) => {
                warn!(error = %e, "rewrite failed, sending original");
                None
            }
        }
    }

    /// Answers an accepted inbound message when its conversation is Autonomous.
    ///
    /// `previous_contact` is the last exchange before `message` arrived.
    pub async fn on_received(
        &self,
        conversation: &str,
        message: &Message,
        previous_contact: Option<DateTime<Utc>>,
    ) -> Option<Message> {
        if message.direction != Direction::Received
            || message.kind != MessageKind::Chat
            || message.content.trim().is_empty()
        {
            return None;
        }
        if self.registry.mode(conversation).await != ChatMode::Autonomous {
            return None;
        }

        let now = self.clock.now();
        let request = CompletionRequest {
            user_text: message.content.clone(),
            system_instruction: self.instruction_at(now).await,
        };
        let reply = match self.complete(request).await {
            Ok(reply) => truncate_words(&reply, self.settings.max_reply_words),
            Err(e) => {
                warn!(conversation, error = %e, "automatic reply failed, staying silent");
                return None;
            }
        };
        if reply.is_empty() {
            return None;
        }

        let fresh = is_fresh_exchange(
            previous_contact,
            now.to_utc(),
            self.settings.greeting_gap_secs,
        );
        let text = compose_reply(
            &reply,
            fresh.then(|| (greeting(now), self.settings.identity_line.as_str())),
        );

        let id = self.deliver(conversation, &text).await;
        let record = Message::chat(id, text, Direction::Sent, self.stamp());
        let stored = self.store(conversation, record).await;
        if stored.is_some() {
            info!(conversation, greeted = fresh, "automatic reply sent");
        }
        stored
    }

    /// The assistant instruction as it would be used right now.
    pub async fn current_instruction(&self) -> String {
        self.instruction_at(self.clock.now()).await
    }

    async fn instruction_at(&self, now: chrono::DateTime<chrono::FixedOffset>) -> String {
        let training = self.registry.training_text().await;
        let schedule = self.registry.schedule().await;
        build_instruction(&training, &self.settings.default_instruction, &schedule, now)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ParleyError> {
        let duration = self.settings.llm_timeout;
        match tokio::time::timeout(duration, self.completer.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ParleyError::Timeout { duration }),
        }
    }

    /// Sends through the provider and returns the id to store the message under.
    ///
    /// A failed send still yields an id: the record stays optimistic.
    async fn deliver(&self, conversation: &str, text: &str) -> String {
        let jid = to_chat_jid(conversation);
        match self.provider.send_text(&jid, text).await {
            Ok(Some(id)) => id,
            Ok(None) => local_message_id(),
            Err(e) => {
                warn!(conversation, error = %e, "provider send failed, keeping optimistic record");
                local_message_id()
            }
        }
    }

    async fn store(&self, conversation: &str, message: Message) -> Option<Message> {
        let contact = self.contacts.lookup(conversation);
        self.committer
            .commit(conversation, message.clone(), contact.as_ref())
            .await
            .map(|_| message)
    }

    fn stamp(&self) -> String {
        format_timestamp(self.clock.now_utc())
    }
}
