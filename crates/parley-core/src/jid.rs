// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation identifier helpers.
//!
//! Provider jids look like `91999@c.us` or `91999:12@s.whatsapp.net`.
//! Conversations are keyed by the bare number.

/// Suffix appended when addressing a 1:1 chat on the provider.
pub const USER_SUFFIX: &str = "@c.us";

/// Strips the server suffix and any `:device` part from a jid.
pub fn normalize_jid(jid: &str) -> String {
    let user = jid.split('@').next().unwrap_or(jid);
    let user = user.split(':').next().unwrap_or(user);
    user.trim().to_string()
}

/// Turns a conversation key back into a provider jid.
pub fn to_chat_jid(conversation: &str) -> String {
    if conversation.contains('@') {
        conversation.to_string()
    } else {
        format!("{conversation}{USER_SUFFIX}")
    }
}

/// The unique tail of a composite message id (`true_91999@c.us_ABC` -> `ABC`).
pub fn id_suffix(id: &str) -> &str {
    id.rsplit('_').next().unwrap_or(id)
}
