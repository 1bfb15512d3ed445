// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation transcripts and the deduplication gate.
//!
//! The gate's scan and the append happen under one lock, so two racing
//! reports of the same logical message can never both be stored.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parley_core::jid::id_suffix;
use parley_core::Message;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::file::JsonFile;

/// Two messages with equal content, direction and kind closer than this are
/// the same logical message.
pub const DUPLICATE_WINDOW_MS: i64 = 8_000;

type Transcripts = BTreeMap<String, Vec<Message>>;

/// One row of the conversation listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub message_count: usize,
    pub last_message: Option<Message>,
}

/// A page of the conversation listing, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub items: Vec<ConversationSummary>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Per-conversation message log persisted as one JSON document.
pub struct TranscriptStore {
    file: JsonFile<Transcripts>,
    state: Mutex<Transcripts>,
}

impl TranscriptStore {
    /// Opens the store, loading whatever the file currently holds.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        let state: Transcripts = file.load().await;
        debug!(
            path = %file.path().display(),
            conversations = state.len(),
            "transcript store opened"
        );
        Self {
            file,
            state: Mutex::new(state),
        }
    }

    /// Admits `candidate` into `conversation` unless it duplicates a stored
    /// message. Returns `true` when the message was appended.
    pub async fn accept(&self, conversation: &str, candidate: Message) -> bool {
        let mut state = self.state.lock().await;
        let log = state.entry(conversation.to_string()).or_default();

        if let Some(reason) = duplicate_of(log, &candidate) {
            debug!(
                conversation,
                id = %candidate.id,
                reason,
                "duplicate message rejected"
            );
            if log.is_empty() {
                state.remove(conversation);
            }
            return false;
        }

        log.push(candidate);
        self.persist(&state).await;
        true
    }

    /// Messages of `conversation` sorted by timestamp.
    ///
    /// The sort is stable, so equal timestamps keep arrival order.
    pub async fn messages(&self, conversation: &str) -> Vec<Message> {
        let state = self.state.lock().await;
        let mut messages = state.get(conversation).cloned().unwrap_or_default();
        sort_by_timestamp(&mut messages);
        messages
    }

    pub async fn conversation_ids(&self) -> Vec<String> {
        self.state.lock().await.keys().cloned().collect()
    }

    /// Conversations ordered by their most recent message, newest first.
    ///
    /// `page` is 1-based; a zero page or limit is treated as 1.
    pub async fn list_conversations(&self, page: usize, limit: usize) -> ConversationPage {
        let page = page.max(1);
        let limit = limit.max(1);

        let mut rows: Vec<ConversationSummary> = {
            let state = self.state.lock().await;
            state
                .iter()
                .map(|(id, log)| ConversationSummary {
                    id: id.clone(),
                    message_count: log.len(),
                    last_message: latest(log).cloned(),
                })
                .collect()
        };

        rows.sort_by(|a, b| {
            let at = |row: &ConversationSummary| {
                row.last_message.as_ref().and_then(Message::parsed_timestamp)
            };
            at(b).cmp(&at(a)).then_with(|| a.id.cmp(&b.id))
        });

        let total = rows.len();
        let items = rows
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        ConversationPage {
            items,
            total,
            page,
            limit,
        }
    }

    /// Removes one message and returns it.
    ///
    /// An exact id match wins; otherwise the first message whose id shares
    /// the unique suffix of `id` is removed, since the client may hold a
    /// differently prefixed form of the provider id.
    pub async fn delete_message(&self, conversation: &str, id: &str) -> Option<Message> {
        let mut state = self.state.lock().await;
        let log = state.get_mut(conversation)?;

        let index = log.iter().position(|m| m.id == id).or_else(|| {
            let suffix = id_suffix(id);
            log.iter().position(|m| id_suffix(&m.id) == suffix)
        })?;

        let removed = log.remove(index);
        self.persist(&state).await;
        Some(removed)
    }

    /// Drops a whole conversation. Returns whether it existed.
    pub async fn delete_conversation(&self, conversation: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.remove(conversation).is_none() {
            return false;
        }
        self.persist(&state).await;
        true
    }

    async fn persist(&self, state: &Transcripts) {
        if let Err(e) = self.file.save(state).await {
            warn!(
                path = %self.file.path().display(),
                error = %e,
                "failed to persist transcripts, keeping in-memory state"
            );
        }
    }
}

/// Why `candidate` would duplicate something in `log`, if it would.
fn duplicate_of(log: &[Message], candidate: &Message) -> Option<&'static str> {
    if log.iter().any(|m| m.id == candidate.id) {
        return Some("id");
    }

    let content = candidate.content.trim();
    if content.is_empty() {
        return None;
    }
    let at = candidate.parsed_timestamp()?;

    log.iter()
        .filter(|m| {
            m.direction == candidate.direction
                && m.kind == candidate.kind
                && m.content.trim() == content
        })
        .filter_map(Message::parsed_timestamp)
        .any(|stored| (stored - at).num_milliseconds().abs() < DUPLICATE_WINDOW_MS)
        .then_some("content")
}

fn latest(log: &[Message]) -> Option<&Message> {
    log.iter()
        .enumerate()
        .max_by_key(|(index, m)| (m.parsed_timestamp(), *index))
        .map(|(_, m)| m)
}

fn sort_by_timestamp(messages: &mut [Message]) {
    messages.sort_by_cached_key(Message::parsed_timestamp);
}
