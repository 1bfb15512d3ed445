// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display identity cache.
//!
//! Entries are never evicted; the set of 1:1 contacts is small and names
//! rarely change within a process lifetime.

use dashmap::DashMap;
use parley_core::jid::to_chat_jid;
use parley_core::types::ContactInfo;
use parley_core::MessagingProvider;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ContactCache {
    entries: DashMap<String, ContactInfo>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, conversation: &str) -> Option<ContactInfo> {
        self.entries.get(conversation).map(|e| e.value().clone())
    }

    pub fn put(&self, conversation: &str, info: ContactInfo) {
        self.entries.insert(conversation.to_string(), info);
    }

    /// Cached identity, fetching name and avatar from the provider on a miss.
    ///
    /// Lookup failures yield an empty identity that is not cached, so the
    /// next message retries.
    pub async fn resolve(
        &self,
        provider: &dyn MessagingProvider,
        conversation: &str,
    ) -> ContactInfo {
        if let Some(info) = self.lookup(conversation) {
            return info;
        }

        let jid = to_chat_jid(conversation);
        let name = match provider.get_contact(&jid).await {
            Ok(contact) => contact.and_then(|c| c.name),
            Err(e) => {
                debug!(conversation, error = %e, "contact lookup failed");
                return ContactInfo::default();
            }
        };
        let profile_pic_url = provider.get_profile_pic(&jid).await.unwrap_or_else(|e| {
            debug!(conversation, error = %e, "profile picture lookup failed");
            None
        });

        let info = ContactInfo {
            name,
            profile_pic_url,
        };
        self.put(conversation, info.clone());
        info
    }
}
