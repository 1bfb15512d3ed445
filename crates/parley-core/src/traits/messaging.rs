// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging provider trait for the browser-automated account session.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::event::ProviderEvent;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatSummary, ContactInfo, MediaPayload};

/// Capability surface of the external messaging transport.
///
/// Inbound events are pushed to Parley separately (webhook); this trait
/// covers everything Parley asks of the provider.
#[async_trait]
pub trait MessagingProvider: PluginAdapter {
    /// Sends a text message. Returns the provider's id for it when known.
    async fn send_text(&self, jid: &str, text: &str) -> Result<Option<String>, ParleyError>;

    /// Downloads the media payload attached to a message.
    async fn download_media(&self, message_id: &str) -> Result<MediaPayload, ParleyError>;

    /// Fetches a single message by its provider id.
    async fn get_message_by_id(&self, id: &str) -> Result<Option<ProviderEvent>, ParleyError>;

    /// Lists recent messages of a chat, oldest first.
    async fn get_all_messages_in_chat(
        &self,
        jid: &str,
        include_me: bool,
        limit: usize,
    ) -> Result<Vec<ProviderEvent>, ParleyError>;

    /// Lists all chats known to the account.
    async fn get_all_chats(&self) -> Result<Vec<ChatSummary>, ParleyError>;

    /// Looks up the display name of a contact.
    async fn get_contact(&self, jid: &str) -> Result<Option<ContactInfo>, ParleyError>;

    /// Looks up the avatar reference of a contact.
    async fn get_profile_pic(&self, jid: &str) -> Result<Option<String>, ParleyError>;

    /// Deletes a message on the provider, optionally for every participant.
    async fn delete_message(
        &self,
        jid: &str,
        message_id: &str,
        for_everyone: bool,
    ) -> Result<(), ParleyError>;
}
