// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content resolution for raw provider events.
//!
//! The provider is known to deliver some messages as placeholders (short
//! text or no text at all) and the full payload only on a later fetch. The
//! resolver escalates in stages, each tried only when the previous one was
//! not enough:
//!
//! 1. scan the event's own text-bearing fields;
//! 2. re-fetch the event by id;
//! 3. chase the ids it references;
//! 4. for known bot senders, score the chat's recent messages.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_core::jid::{id_suffix, normalize_jid, to_chat_jid};
use parley_core::types::{MediaPayload, MessageKind, ResolvedContent};
use parley_core::{MessagingProvider, ProviderEvent};
use serde_json::Value;
use tracing::{debug, warn};

/// Text this short (in characters) next to bot metadata is treated as a placeholder.
pub const SHORT_TEXT_LIMIT: usize = 8;

/// Stored in place of media that could not be fetched.
pub const MEDIA_ERROR_PLACEHOLDER: &str = "[Error processing media]";

const BASE64_MIN_LEN: usize = 64;

/// Seconds of distance beyond which a recent message gets no time score.
const SCAN_WINDOW_SECS: i64 = 600;

const SUFFIX_MATCH_SCORE: i64 = 1_000;

/// Where a candidate text may live on an event.
#[derive(Debug, Clone, Copy)]
enum TextSource {
    /// A string at a dotted path.
    Field(&'static str),
    /// An array of fragments at a dotted path, joined.
    Fragments(&'static str),
}

const TEXT_SOURCES: &[TextSource] = &[
    TextSource::Field("body"),
    TextSource::Field("caption"),
    TextSource::Field("text"),
    TextSource::Field("content"),
    TextSource::Field("conversation"),
    TextSource::Field("message.conversation"),
    TextSource::Field("message.extendedTextMessage.text"),
    TextSource::Field("extendedTextMessage.text"),
    TextSource::Field("listResponse.title"),
    TextSource::Field("listResponse.singleSelectReply.selectedRowId"),
    TextSource::Field("buttonsResponse.selectedDisplayText"),
    TextSource::Field("templateButtonReplyMessage.selectedDisplayText"),
    TextSource::Field("interactiveResponseMessage.body.text"),
    TextSource::Fragments("richResponse"),
    TextSource::Fragments("botResponse.richResponse"),
];

impl TextSource {
    fn extract(self, event: &ProviderEvent) -> Option<String> {
        match self {
            Self::Field(path) => event.str_at(path).map(str::to_string),
            Self::Fragments(path) => join_fragments(event.value_at(path)?),
        }
    }
}

fn join_fragments(value: &Value) -> Option<String> {
    let parts: Vec<&str> = value
        .as_array()?
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => ["text", "messageText"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str)),
            _ => None,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// True for long, whitespace-free runs of the base64 alphabet and for data URLs.
pub fn looks_like_base64(text: &str) -> bool {
    if text.starts_with("data:") && text.contains(";base64,") {
        return true;
    }
    text.len() >= BASE64_MIN_LEN
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
}

/// Longest usable text among the event's candidate fields.
///
/// Ties keep the earlier source.
pub fn extract_text(event: &ProviderEvent) -> Option<String> {
    TEXT_SOURCES
        .iter()
        .filter_map(|source| source.extract(event))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && !looks_like_base64(text))
        .fold(None, |best: Option<String>, text| match best {
            Some(b) if b.chars().count() >= text.chars().count() => Some(b),
            _ => Some(text),
        })
}

fn is_composite_id(id: &str) -> bool {
    id.starts_with("true_") || id.starts_with("false_")
}

/// Ids under which a referenced message may be stored on the provider.
///
/// A bare fragment is expanded into the `false_<jid>_<fragment>` and
/// `true_<jid>_<fragment>` forms for every known remote jid and for this
/// account. The fragment itself always comes first.
pub fn build_candidate_ids(
    fragment: &str,
    known_remote_jids: &[String],
    self_id: Option<&str>,
) -> Vec<String> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return Vec::new();
    }

    let mut ids = vec![fragment.to_string()];
    if !is_composite_id(fragment) {
        let jids = known_remote_jids
            .iter()
            .map(String::as_str)
            .chain(self_id)
            .filter(|jid| !jid.is_empty())
            .map(to_chat_jid);
        for jid in jids {
            for from_me in ["false", "true"] {
                let id = format!("{from_me}_{jid}_{fragment}");
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

fn encode_media(payload: MediaPayload) -> Option<String> {
    let encoded = match payload {
        MediaPayload::Bytes(bytes) => STANDARD.encode(bytes),
        MediaPayload::Encoded(text) => match text.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data.to_string(),
            _ => text,
        },
    };
    (!encoded.trim().is_empty()).then_some(encoded)
}

fn chars(text: &str) -> usize {
    text.chars().count()
}

/// Replaces `best` when `candidate` is strictly longer.
fn offer(best: &mut Option<String>, candidate: Option<String>) {
    if let Some(candidate) = candidate
        && best.as_deref().is_none_or(|b| chars(&candidate) > chars(b))
    {
        *best = Some(candidate);
    }
}

fn good_enough(best: &Option<String>) -> bool {
    best.as_deref().is_some_and(|t| chars(t) > SHORT_TEXT_LIMIT)
}

pub struct ContentResolver {
    provider: Arc<dyn MessagingProvider>,
    bot_ids: Vec<String>,
    self_id: Option<String>,
    history_limit: usize,
}

impl ContentResolver {
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        bot_ids: Vec<String>,
        self_id: Option<String>,
        history_limit: usize,
    ) -> Self {
        Self {
            provider,
            bot_ids,
            self_id,
            history_limit,
        }
    }

    /// Resolves the storable content of `event`, or `None` to drop it.
    pub async fn resolve(&self, event: &ProviderEvent) -> Option<ResolvedContent> {
        if event.is_out_of_scope() {
            debug!(id = ?event.id(), "ignoring group, status or broadcast event");
            return None;
        }

        if event.has_media() {
            return Some(self.resolve_media(event).await);
        }

        let text = extract_text(event);
        let placeholder = match text.as_deref() {
            None => true,
            Some(t) => chars(t) <= SHORT_TEXT_LIMIT && event.has_bot_metadata(),
        };
        let text = if placeholder {
            self.deep_resolve(event, text).await
        } else {
            text
        };

        match text {
            Some(text) => Some(ResolvedContent::text(text)),
            None => {
                debug!(
                    id = ?event.id(),
                    kind = event.message_type(),
                    "no resolvable content, dropping event"
                );
                None
            }
        }
    }

    async fn resolve_media(&self, event: &ProviderEvent) -> ResolvedContent {
        let kind =
            MessageKind::from_media_type(event.message_type()).unwrap_or(MessageKind::Document);
        let placeholder = ResolvedContent::text(MEDIA_ERROR_PLACEHOLDER);

        let Some(id) = event.id() else {
            warn!("media event without id");
            return placeholder;
        };

        match self.provider.download_media(id).await {
            Ok(payload) => match encode_media(payload) {
                Some(content) => ResolvedContent {
                    kind,
                    content,
                    mime_type: event.mimetype().map(str::to_string),
                },
                None => {
                    warn!(id, "media download returned no data");
                    placeholder
                }
            },
            Err(e) => {
                warn!(id, error = %e, "media download failed");
                placeholder
            }
        }
    }

    async fn deep_resolve(
        &self,
        event: &ProviderEvent,
        current: Option<String>,
    ) -> Option<String> {
        let mut best = current;

        if let Some(id) = event.id() {
            match self.provider.get_message_by_id(id).await {
                Ok(Some(fresh)) => offer(&mut best, extract_text(&fresh)),
                Ok(None) => {}
                Err(e) => debug!(id, error = %e, "re-fetch failed"),
            }
            if good_enough(&best) {
                debug!(id, "resolved by re-fetch");
                return best;
            }
        }

        let known = self.known_remote_jids(event);
        for reference in event.reference_ids() {
            for candidate in build_candidate_ids(reference, &known, self.self_id.as_deref()) {
                match self.provider.get_message_by_id(&candidate).await {
                    Ok(Some(parent)) => offer(&mut best, extract_text(&parent)),
                    Ok(None) => continue,
                    Err(e) => debug!(id = %candidate, error = %e, "reference fetch failed"),
                }
                if good_enough(&best) {
                    debug!(reference, "resolved through reference");
                    return best;
                }
            }
        }

        if event.from().is_some_and(|from| self.is_bot(from)) {
            let found = self.scan_recent(event, best.as_deref()).await;
            offer(&mut best, found);
        }
        best
    }

    fn is_bot(&self, jid: &str) -> bool {
        let user = normalize_jid(jid);
        self.bot_ids.iter().any(|bot| normalize_jid(bot) == user)
    }

    fn known_remote_jids(&self, event: &ProviderEvent) -> Vec<String> {
        let own = self.self_id.as_deref().map(normalize_jid);
        let mut jids: Vec<String> = Vec::new();
        for jid in [event.str_at("chatId"), event.from(), event.to()]
            .into_iter()
            .flatten()
        {
            if own.as_deref() == Some(normalize_jid(jid).as_str()) {
                continue;
            }
            if !jids.iter().any(|j| j == jid) {
                jids.push(jid.to_string());
            }
        }
        jids
    }

    /// Best text among the chat's recent messages, scored by id-suffix match
    /// and by closeness in time to `event`.
    ///
    /// Placeholder-length texts and texts no longer than `current` never
    /// compete, so the event's own copy in the history cannot win.
    async fn scan_recent(&self, event: &ProviderEvent, current: Option<&str>) -> Option<String> {
        let chat = event.chat_jid()?;
        let history = match self
            .provider
            .get_all_messages_in_chat(chat, true, self.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                debug!(chat, error = %e, "recent message scan failed");
                return None;
            }
        };

        let suffixes: Vec<&str> = event
            .id()
            .into_iter()
            .chain(event.reference_ids())
            .map(id_suffix)
            .collect();
        let at = event.unix_time();
        let floor = current.map_or(SHORT_TEXT_LIMIT, |t| chars(t).max(SHORT_TEXT_LIMIT));

        history
            .iter()
            .filter_map(|candidate| {
                let text = extract_text(candidate).filter(|t| chars(t) > floor)?;
                let mut score = 0;
                if candidate
                    .id()
                    .is_some_and(|id| suffixes.contains(&id_suffix(id)))
                {
                    score += SUFFIX_MATCH_SCORE;
                }
                if let (Some(at), Some(t)) = (at, candidate.unix_time()) {
                    score += (SCAN_WINDOW_SECS - (t - at).abs()).max(0);
                }
                (score > 0).then_some((score, text))
            })
            .max_by(|(sa, ta), (sb, tb)| sa.cmp(sb).then_with(|| chars(ta).cmp(&chars(tb))))
            .map(|(_, text)| text)
    }
}
