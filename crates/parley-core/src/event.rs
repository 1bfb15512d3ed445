// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw inbound events as delivered by the messaging provider.
//!
//! Provider events are loosely structured JSON with many optional,
//! sometimes nested, fields. [`ProviderEvent`] keeps the raw value and
//! offers typed accessors for the handful of fields the pipeline relies on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields that point at a message this event responds to.
const REFERENCE_FIELDS: &[&str] = &["botResponseTargetId", "parentMsgId"];

/// Fields that mark an event as carrying bot metadata.
const BOT_METADATA_FIELDS: &[&str] = &["botResponseTargetId", "parentMsgId", "invokedBotWid"];

/// Origin flags for traffic outside the 1:1 assistant use case.
const OUT_OF_SCOPE_FLAGS: &[&str] = &["isGroupMsg", "isStatus", "isNewsletter", "isBroadcast"];

/// Jid suffixes for group, status, broadcast and channel traffic.
const OUT_OF_SCOPE_SUFFIXES: &[&str] = &["@g.us", "@broadcast", "@newsletter"];

/// A raw provider event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderEvent(Value);

impl ProviderEvent {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Looks up a dotted path such as `message.extendedTextMessage.text`.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.get(segment))
    }

    /// String value at a dotted path.
    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.value_at(path).and_then(Value::as_str)
    }

    /// Boolean flag at a dotted path; absent or non-boolean reads as `false`.
    pub fn flag(&self, path: &str) -> bool {
        self.value_at(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Message id. Accepts both a plain string and a `{ "_serialized": .. }` object.
    pub fn id(&self) -> Option<&str> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("_serialized").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn from(&self) -> Option<&str> {
        self.str_at("from")
    }

    pub fn to(&self) -> Option<&str> {
        self.str_at("to")
    }

    /// Whether this account authored the message.
    pub fn from_me(&self) -> bool {
        self.flag("fromMe") || self.flag("id.fromMe")
    }

    /// Provider-reported message type, `chat` when absent.
    pub fn message_type(&self) -> &str {
        self.str_at("type").unwrap_or("chat")
    }

    /// Unix seconds from `t` (or `timestamp`).
    pub fn unix_time(&self) -> Option<i64> {
        ["t", "timestamp"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_i64))
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.str_at("mimetype")
    }

    /// Jid of the remote party: the recipient for own messages, the sender otherwise.
    pub fn chat_jid(&self) -> Option<&str> {
        if let Some(chat) = self.str_at("chatId") {
            return Some(chat);
        }
        if self.from_me() {
            self.to()
        } else {
            self.from()
        }
    }

    /// True for group, status, broadcast and newsletter traffic.
    pub fn is_out_of_scope(&self) -> bool {
        if OUT_OF_SCOPE_FLAGS.iter().any(|f| self.flag(f)) {
            return true;
        }
        [self.from(), self.to()]
            .into_iter()
            .flatten()
            .any(|jid| OUT_OF_SCOPE_SUFFIXES.iter().any(|s| jid.ends_with(s)))
    }

    /// True when the provider signals a media payload.
    pub fn has_media(&self) -> bool {
        self.flag("hasMedia")
            || self.flag("isMedia")
            || crate::types::MessageKind::from_media_type(self.message_type()).is_some()
    }

    /// True when the event carries reply-to or invoked-by bot references.
    pub fn has_bot_metadata(&self) -> bool {
        BOT_METADATA_FIELDS
            .iter()
            .any(|f| self.str_at(f).is_some_and(|v| !v.is_empty()))
    }

    /// Ids of messages this event refers to, in lookup order.
    pub fn reference_ids(&self) -> Vec<&str> {
        REFERENCE_FIELDS
            .iter()
            .filter_map(|f| self.str_at(f))
            .filter(|v| !v.is_empty())
            .collect()
    }
}

impl From<Value> for ProviderEvent {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_basic_fields() {
        let ev = ProviderEvent::new(json!({
            "id": "A1", "from": "91999@c.us", "fromMe": false,
            "t": 1700000000, "type": "chat", "body": "mai theek hu"
        }));
        assert_eq!(ev.id(), Some("A1"));
        assert_eq!(ev.chat_jid(), Some("91999@c.us"));
        assert_eq!(ev.unix_time(), Some(1_700_000_000));
        assert_eq!(ev.message_type(), "chat");
        assert!(!ev.has_media());
        assert!(!ev.is_out_of_scope());
    }

    #[test]
    fn serialized_id_object_and_from_me() {
        let ev = ProviderEvent::new(json!({
            "id": {"fromMe": true, "_serialized": "true_91999@c.us_ABC"},
            "from": "me@c.us", "to": "91999@c.us"
        }));
        assert_eq!(ev.id(), Some("true_91999@c.us_ABC"));
        assert!(ev.from_me());
        assert_eq!(ev.chat_jid(), Some("91999@c.us"));
    }

    #[test]
    fn group_and_status_are_out_of_scope() {
        let group = ProviderEvent::new(json!({"from": "123-456@g.us"}));
        let status = ProviderEvent::new(json!({"from": "status@broadcast"}));
        let flagged = ProviderEvent::new(json!({"from": "91999@c.us", "isNewsletter": true}));
        assert!(group.is_out_of_scope());
        assert!(status.is_out_of_scope());
        assert!(flagged.is_out_of_scope());
    }

    #[test]
    fn nested_path_lookup() {
        let ev = ProviderEvent::new(json!({
            "message": {"extendedTextMessage": {"text": "long form"}}
        }));
        assert_eq!(ev.str_at("message.extendedTextMessage.text"), Some("long form"));
        assert_eq!(ev.str_at("message.missing.text"), None);
    }

    #[test]
    fn bot_references() {
        let ev = ProviderEvent::new(json!({
            "parentMsgId": "P1", "botResponseTargetId": "", "invokedBotWid": "bot@c.us"
        }));
        assert!(ev.has_bot_metadata());
        assert_eq!(ev.reference_ids(), vec!["P1"]);
    }
}
