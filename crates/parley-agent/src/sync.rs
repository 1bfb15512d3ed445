// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of messages sent from the primary device.
//!
//! The provider does not always emit events for messages the owner types
//! on the phone. The sync pass pulls recent history per conversation and
//! feeds unseen own messages through the same commit path as live events.
//! A per-conversation high-water mark (unix seconds) bounds each pass.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parley_core::jid::{normalize_jid, to_chat_jid};
use parley_core::{MessagingProvider, ParleyError};
use parley_storage::TranscriptStore;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::commit::Committer;
use crate::contacts::ContactCache;
use crate::pipeline::message_from_event;
use crate::resolver::ContentResolver;

/// Totals for one full reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub conversations: usize,
    pub imported: usize,
    pub failed: usize,
}

pub struct SyncRunner {
    provider: Arc<dyn MessagingProvider>,
    resolver: Arc<ContentResolver>,
    committer: Arc<Committer>,
    contacts: Arc<ContactCache>,
    store: Arc<TranscriptStore>,
    clock: Arc<dyn Clock>,
    history_limit: usize,
    initial_mark: i64,
    marks: DashMap<String, i64>,
    run_lock: Mutex<()>,
    conversation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SyncRunner {
    /// Conversations first seen by the runner start `lookback` before now.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        resolver: Arc<ContentResolver>,
        committer: Arc<Committer>,
        contacts: Arc<ContactCache>,
        store: Arc<TranscriptStore>,
        clock: Arc<dyn Clock>,
        history_limit: usize,
        lookback: Duration,
    ) -> Self {
        let lookback = i64::try_from(lookback.as_secs()).unwrap_or(i64::MAX);
        let initial_mark = clock.now_utc().timestamp().saturating_sub(lookback);
        Self {
            provider,
            resolver,
            committer,
            contacts,
            store,
            clock,
            history_limit,
            initial_mark,
            marks: DashMap::new(),
            run_lock: Mutex::new(()),
            conversation_locks: DashMap::new(),
        }
    }

    /// Current high-water mark for `conversation`, in unix seconds.
    pub fn mark(&self, conversation: &str) -> i64 {
        self.marks
            .get(conversation)
            .map(|m| *m)
            .unwrap_or(self.initial_mark)
    }

    /// Runs one pass over every tracked conversation.
    ///
    /// Returns `None` without doing anything when a pass is already running.
    pub async fn run_once(&self) -> Option<SyncReport> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            debug!("sync pass already running, skipping");
            return None;
        };

        let mut report = SyncReport::default();
        for conversation in self.tracked_conversations().await {
            report.conversations += 1;
            match self.sync_conversation(&conversation).await {
                Ok(imported) => report.imported += imported,
                Err(e) => {
                    report.failed += 1;
                    warn!(conversation = %conversation, error = %e, "conversation sync failed");
                }
            }
        }

        if report.imported > 0 || report.failed > 0 {
            info!(
                conversations = report.conversations,
                imported = report.imported,
                failed = report.failed,
                "sync pass finished"
            );
        } else {
            debug!(conversations = report.conversations, "sync pass found nothing new");
        }
        Some(report)
    }

    /// Stored conversations plus the provider's 1:1 chats.
    async fn tracked_conversations(&self) -> BTreeSet<String> {
        let mut tracked: BTreeSet<String> = self.store.conversation_ids().await.into_iter().collect();
        match self.provider.get_all_chats().await {
            Ok(chats) => tracked.extend(
                chats
                    .into_iter()
                    .filter(|c| !c.is_group && !c.id.ends_with("@g.us"))
                    .map(|c| normalize_jid(&c.id))
                    .filter(|id| !id.is_empty()),
            ),
            Err(e) => debug!(error = %e, "chat listing unavailable, syncing stored conversations only"),
        }
        tracked
    }

    /// Imports unseen own messages for one conversation.
    ///
    /// Returns how many were newly stored.
    pub async fn sync_conversation(&self, conversation: &str) -> Result<usize, ParleyError> {
        let lock = self
            .conversation_locks
            .entry(conversation.to_string())
            .or_default()
            .value()
            .clone();
        let _guard = lock.lock().await;

        let history = self
            .provider
            .get_all_messages_in_chat(&to_chat_jid(conversation), true, self.history_limit)
            .await?;

        let mark = self.mark(conversation);
        let mut high = mark;
        let mut imported = 0;
        for event in history.iter().filter(|e| e.from_me()) {
            let Some(t) = event.unix_time() else {
                continue;
            };
            high = high.max(t);
            if t <= mark {
                continue;
            }

            let Some(resolved) = self.resolver.resolve(event).await else {
                continue;
            };
            let Some((_, message)) = message_from_event(event, resolved, self.clock.now_utc())
            else {
                continue;
            };
            let contact = self.contacts.lookup(conversation);
            if self
                .committer
                .commit(conversation, message, contact.as_ref())
                .await
                .is_some()
            {
                imported += 1;
            }
        }

        self.marks.insert(conversation.to_string(), high);
        if imported > 0 {
            debug!(conversation, imported, mark = high, "own messages reconciled");
        }
        Ok(imported)
    }

    /// Starts an on-demand sync of one conversation in the background.
    pub fn spawn_for(self: &Arc<Self>, conversation: &str) {
        let runner = Arc::clone(self);
        let conversation = conversation.to_string();
        tokio::spawn(async move {
            if let Err(e) = runner.sync_conversation(&conversation).await {
                debug!(conversation = %conversation, error = %e, "on-demand sync failed");
            }
        });
    }

    /// Runs a pass every `interval` until `cancel` fires.
    pub async fn run_periodic(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("sync task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }
}
