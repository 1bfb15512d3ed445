// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, agent, and gateway crates.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Messaging,
    Completion,
}

/// Payload classification of a stored message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Chat,
    Image,
    Sticker,
    Video,
    /// Audio files and push-to-talk voice notes.
    Audio,
    Document,
}

impl MessageKind {
    /// Maps a provider-reported message type onto a media kind.
    ///
    /// Returns `None` for non-media types.
    pub fn from_media_type(provider_type: &str) -> Option<Self> {
        match provider_type {
            "image" => Some(Self::Image),
            "sticker" => Some(Self::Sticker),
            "video" | "gif" => Some(Self::Video),
            "audio" | "ptt" => Some(Self::Audio),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Which side of the conversation produced a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Originated from this account.
    Sent,
    /// Originated from the remote party.
    Received,
}

/// Per-conversation behavior setting.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatMode {
    /// Outbound text is sent unmodified; nothing is generated.
    #[default]
    Manual,
    /// Outbound text is rewritten by the LLM before sending.
    Assisted,
    /// Received text is answered automatically.
    Autonomous,
}

/// One stored message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// RFC 3339 timestamp in UTC.
    pub timestamp: String,
    pub direction: Direction,
    #[serde(default)]
    pub is_assisted_original: bool,
    #[serde(default)]
    pub is_assisted_rewrite: bool,
}

impl Message {
    /// Builds a plain chat message.
    pub fn chat(
        id: impl Into<String>,
        content: impl Into<String>,
        direction: Direction,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: MessageKind::Chat,
            mime_type: None,
            timestamp: timestamp.into(),
            direction,
            is_assisted_original: false,
            is_assisted_rewrite: false,
        }
    }

    /// Parsed timestamp, or `None` when the stored string is malformed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Content extracted from a raw provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub kind: MessageKind,
    pub content: String,
    pub mime_type: Option<String>,
}

impl ResolvedContent {
    /// Textual content under the `chat` kind.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Chat,
            content: content.into(),
            mime_type: None,
        }
    }
}

/// Binary payload returned by a media download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// Raw bytes that still need encoding.
    Bytes(Vec<u8>),
    /// Already encoded text (base64 or a `data:` URL).
    Encoded(String),
}

/// Display identity of a remote party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

/// A chat as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}

/// A single-turn completion request for the LLM collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub user_text: String,
    pub system_instruction: String,
}

/// Push event delivered to every connected viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
    Message(MessageEvent),
    MessageDeleted { from: String, id: String },
    ConversationDeleted { from: String },
}

impl ViewerEvent {
    /// Conversation the event belongs to.
    pub fn conversation(&self) -> &str {
        match self {
            Self::Message(m) => &m.from,
            Self::MessageDeleted { from, .. } | Self::ConversationDeleted { from } => from,
        }
    }
}

/// Wire shape of an accepted message pushed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub from: String,
    #[serde(rename = "subType")]
    pub sub_type: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub timestamp: String,
    pub direction: Direction,
    #[serde(
        rename = "contactName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_name: Option<String>,
    #[serde(
        rename = "contactProfilePicUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_profile_pic_url: Option<String>,
    pub id: String,
    #[serde(
        rename = "isOriginalInSemiAI",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_original_in_semi_ai: bool,
    #[serde(
        rename = "isAIRewrite",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_ai_rewrite: bool,
}

impl MessageEvent {
    /// Builds the push event for a message accepted into `conversation`.
    pub fn new(conversation: &str, message: &Message, contact: Option<&ContactInfo>) -> Self {
        Self {
            from: conversation.to_string(),
            sub_type: message.kind,
            content: message.content.clone(),
            mimetype: message.mime_type.clone(),
            timestamp: message.timestamp.clone(),
            direction: message.direction,
            contact_name: contact.and_then(|c| c.name.clone()),
            contact_profile_pic_url: contact.and_then(|c| c.profile_pic_url.clone()),
            id: message.id.clone(),
            is_original_in_semi_ai: message.is_assisted_original,
            is_ai_rewrite: message.is_assisted_rewrite,
        }
    }
}

/// Formats a point in time the way transcripts store it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Converts provider unix seconds into a stored timestamp.
///
/// Out-of-range values fall back to the epoch.
pub fn timestamp_from_unix(secs: i64) -> String {
    let at = Utc
        .timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    format_timestamp(at)
}

/// Parses a stored RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn message_serializes_camel_case() {
        let mut msg = Message::chat("A1", "hi", Direction::Received, "2025-01-01T00:00:00.000Z");
        msg.is_assisted_original = true;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "chat");
        assert_eq!(json["direction"], "received");
        assert_eq!(json["isAssistedOriginal"], true);
        assert!(json.get("mimeType").is_none());
    }

    #[test]
    fn message_deserializes_without_flags() {
        let json = r#"{"id":"x","content":"c","kind":"audio","mimeType":"audio/ogg",
            "timestamp":"2025-01-01T00:00:00.000Z","direction":"sent"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, MessageKind::Audio);
        assert!(!msg.is_assisted_original);
        assert!(!msg.is_assisted_rewrite);
    }

    #[test]
    fn ptt_maps_to_audio() {
        assert_eq!(MessageKind::from_media_type("ptt"), Some(MessageKind::Audio));
        assert_eq!(MessageKind::from_media_type("image"), Some(MessageKind::Image));
        assert_eq!(MessageKind::from_media_type("chat"), None);
    }

    #[test]
    fn chat_mode_parses_lowercase() {
        assert_eq!(ChatMode::from_str("assisted").unwrap(), ChatMode::Assisted);
        assert_eq!(ChatMode::Autonomous.to_string(), "autonomous");
        assert_eq!(ChatMode::default(), ChatMode::Manual);
    }

    #[test]
    fn viewer_event_wire_shape() {
        let mut msg = Message::chat("id-1", "hello", Direction::Sent, "2025-01-01T00:00:00.000Z");
        msg.is_assisted_rewrite = true;
        let contact = ContactInfo {
            name: Some("Asha".into()),
            profile_pic_url: None,
        };
        let event = ViewerEvent::Message(MessageEvent::new("91999", &msg, Some(&contact)));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["from"], "91999");
        assert_eq!(json["subType"], "chat");
        assert_eq!(json["contactName"], "Asha");
        assert_eq!(json["isAIRewrite"], true);
        assert!(json.get("isOriginalInSemiAI").is_none());
        assert!(json.get("contactProfilePicUrl").is_none());
    }

    #[test]
    fn deleted_event_is_snake_case_tagged() {
        let event = ViewerEvent::MessageDeleted {
            from: "91999".into(),
            id: "m1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message_deleted");
        assert_eq!(event.conversation(), "91999");
    }

    #[test]
    fn unix_timestamp_round_trips_through_parse() {
        let ts = timestamp_from_unix(1_700_000_000);
        assert_eq!(ts, "2023-11-14T22:13:20.000Z");
        assert_eq!(parse_timestamp(&ts).unwrap().timestamp(), 1_700_000_000);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
