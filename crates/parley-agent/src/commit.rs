// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gate, persist and publish as one ordered step per conversation.
//!
//! Every path that stores a message goes through [`Committer::commit`].
//! Holding the conversation lock across accept and publish keeps the
//! viewers' order identical to the acceptance order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::types::ContactInfo;
use parley_core::{Message, MessageEvent, ViewerEvent};
use parley_storage::{ModeRegistry, TranscriptStore};
use tokio::sync::Mutex;
use tracing::debug;

use crate::fanout::Fanout;

/// Outcome of an accepted commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// Last exchange with the conversation before this message.
    pub previous_contact: Option<DateTime<Utc>>,
}

pub struct Committer {
    store: Arc<TranscriptStore>,
    registry: Arc<ModeRegistry>,
    fanout: Fanout,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Committer {
    pub fn new(store: Arc<TranscriptStore>, registry: Arc<ModeRegistry>, fanout: Fanout) -> Self {
        Self {
            store,
            registry,
            fanout,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, conversation: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Stores `message` unless the gate rejects it, then publishes it.
    ///
    /// `None` means the message was a duplicate and nothing happened.
    pub async fn commit(
        &self,
        conversation: &str,
        message: Message,
        contact: Option<&ContactInfo>,
    ) -> Option<Committed> {
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;

        let event = MessageEvent::new(conversation, &message, contact);
        let at = message.parsed_timestamp().unwrap_or_else(Utc::now);
        let id = message.id.clone();

        if !self.store.accept(conversation, message).await {
            return None;
        }

        let previous_contact = self.registry.touch_contact(conversation, at).await;
        let receivers = self.fanout.publish(ViewerEvent::Message(event));
        debug!(conversation, id = %id, receivers, "message committed");

        Some(Committed { previous_contact })
    }

    /// Publishes a non-message event under the conversation lock.
    pub async fn announce(&self, event: ViewerEvent) {
        let lock = self.lock_for(event.conversation());
        let _guard = lock.lock().await;
        self.fanout.publish(event);
    }

    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }
}
