// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound provider events: resolve, commit, then dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_core::jid::normalize_jid;
use parley_core::types::{format_timestamp, timestamp_from_unix, ResolvedContent};
use parley_core::{Direction, Message, MessagingProvider, ProviderEvent};
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::commit::Committer;
use crate::contacts::ContactCache;
use crate::dispatcher::{local_message_id, Dispatcher};
use crate::resolver::ContentResolver;
use crate::sync::SyncRunner;

/// Builds the transcript record for a resolved provider event.
///
/// Returns the normalized conversation id alongside the message, or `None`
/// when the event names no chat.
pub fn message_from_event(
    event: &ProviderEvent,
    resolved: ResolvedContent,
    now: DateTime<Utc>,
) -> Option<(String, Message)> {
    let conversation = normalize_jid(event.chat_jid()?);
    if conversation.is_empty() {
        return None;
    }

    let message = Message {
        id: event
            .id()
            .map(str::to_string)
            .unwrap_or_else(local_message_id),
        content: resolved.content,
        kind: resolved.kind,
        mime_type: resolved.mime_type,
        timestamp: event
            .unix_time()
            .map(timestamp_from_unix)
            .unwrap_or_else(|| format_timestamp(now)),
        direction: if event.from_me() {
            Direction::Sent
        } else {
            Direction::Received
        },
        is_assisted_original: false,
        is_assisted_rewrite: false,
    };
    Some((conversation, message))
}

pub struct Pipeline {
    provider: Arc<dyn MessagingProvider>,
    resolver: Arc<ContentResolver>,
    committer: Arc<Committer>,
    dispatcher: Arc<Dispatcher>,
    contacts: Arc<ContactCache>,
    sync: Arc<SyncRunner>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        resolver: Arc<ContentResolver>,
        committer: Arc<Committer>,
        dispatcher: Arc<Dispatcher>,
        contacts: Arc<ContactCache>,
        sync: Arc<SyncRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            resolver,
            committer,
            dispatcher,
            contacts,
            sync,
            clock,
        }
    }

    /// Handles one provider event end to end.
    ///
    /// Returns the stored message, or `None` when the event was out of
    /// scope, unresolvable or a duplicate.
    #[instrument(skip_all, fields(id = event.id().unwrap_or("-")))]
    pub async fn handle_event(&self, event: ProviderEvent) -> Option<Message> {
        let Some(resolved) = self.resolver.resolve(&event).await else {
            debug!("event dropped, no content");
            return None;
        };
        let (conversation, message) =
            message_from_event(&event, resolved, self.clock.now_utc())?;

        let contact = self
            .contacts
            .resolve(self.provider.as_ref(), &conversation)
            .await;
        let committed = self
            .committer
            .commit(&conversation, message.clone(), Some(&contact))
            .await?;

        if message.direction == Direction::Received {
            self.sync.spawn_for(&conversation);
            self.dispatcher
                .on_received(&conversation, &message, committed.previous_contact)
                .await;
        }
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use parley_core::MessageKind;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_736_150_000, 0).unwrap()
    }

    #[test]
    fn received_event_maps_to_received_message() {
        let event = ProviderEvent::new(json!({
            "id": "false_911@c.us_AAA",
            "from": "911@c.us",
            "t": 1_736_000_000,
            "fromMe": false,
            "body": "hi"
        }));
        let (conversation, message) =
            message_from_event(&event, ResolvedContent::text("hi"), now()).unwrap();
        assert_eq!(conversation, "911");
        assert_eq!(message.id, "false_911@c.us_AAA");
        assert_eq!(message.direction, Direction::Received);
        assert_eq!(message.kind, MessageKind::Chat);
        assert_eq!(message.timestamp, timestamp_from_unix(1_736_000_000));
    }

    #[test]
    fn sent_event_uses_recipient_and_now() {
        let event = ProviderEvent::new(json!({
            "from": "self@c.us",
            "to": "912@c.us",
            "fromMe": true
        }));
        let (conversation, message) =
            message_from_event(&event, ResolvedContent::text("yo"), now()).unwrap();
        assert_eq!(conversation, "912");
        assert_eq!(message.direction, Direction::Sent);
        assert!(message.id.starts_with("local_"));
        assert_eq!(message.timestamp, format_timestamp(now()));
    }

    #[test]
    fn event_without_chat_is_skipped() {
        let event = ProviderEvent::new(json!({ "body": "orphan" }));
        assert!(message_from_event(&event, ResolvedContent::text("orphan"), now()).is_none());
    }
}
