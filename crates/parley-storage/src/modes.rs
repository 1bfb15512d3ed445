// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation mode assignments and assistant inputs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parley_core::types::{format_timestamp, parse_timestamp};
use parley_core::ChatMode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::file::JsonFile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Registry {
    #[serde(default)]
    modes: BTreeMap<String, ChatMode>,
    #[serde(default)]
    training_text: String,
    #[serde(default)]
    schedule: String,
    #[serde(default)]
    last_contact: BTreeMap<String, String>,
}

/// Durable per-conversation modes plus the global assistant inputs.
pub struct ModeRegistry {
    file: JsonFile<Registry>,
    state: Mutex<Registry>,
}

impl ModeRegistry {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        let state: Registry = file.load().await;
        debug!(
            path = %file.path().display(),
            assignments = state.modes.len(),
            "mode registry opened"
        );
        Self {
            file,
            state: Mutex::new(state),
        }
    }

    /// Mode of `conversation`; Manual when never set.
    pub async fn mode(&self, conversation: &str) -> ChatMode {
        self.state
            .lock()
            .await
            .modes
            .get(conversation)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set_mode(&self, conversation: &str, mode: ChatMode) {
        let mut state = self.state.lock().await;
        state.modes.insert(conversation.to_string(), mode);
        info!(conversation, %mode, "conversation mode set");
        self.persist(&state).await;
    }

    pub async fn training_text(&self) -> String {
        self.state.lock().await.training_text.clone()
    }

    pub async fn schedule(&self) -> String {
        self.state.lock().await.schedule.clone()
    }

    /// Replaces whichever assistant inputs are given.
    pub async fn set_assistant(&self, training_text: Option<String>, schedule: Option<String>) {
        let mut state = self.state.lock().await;
        if let Some(text) = training_text {
            state.training_text = text;
        }
        if let Some(text) = schedule {
            state.schedule = text;
        }
        self.persist(&state).await;
    }

    /// Records an exchange at `at`, returning the previous contact time.
    ///
    /// Earlier times never move the mark backwards.
    pub async fn touch_contact(
        &self,
        conversation: &str,
        at: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let mut state = self.state.lock().await;
        let previous = state
            .last_contact
            .get(conversation)
            .and_then(|raw| parse_timestamp(raw));
        if previous.is_some_and(|p| p >= at) {
            return previous;
        }
        state
            .last_contact
            .insert(conversation.to_string(), format_timestamp(at));
        self.persist(&state).await;
        previous
    }

    /// Drops the last-contact mark of `conversation`.
    pub async fn forget_contact(&self, conversation: &str) {
        let mut state = self.state.lock().await;
        if state.last_contact.remove(conversation).is_some() {
            self.persist(&state).await;
        }
    }

    async fn persist(&self, state: &Registry) {
        if let Err(e) = self.file.save(state).await {
            warn!(
                path = %self.file.path().display(),
                error = %e,
                "failed to persist mode registry, keeping in-memory state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn default_mode_is_manual() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModeRegistry::open(dir.path().join("modes.json")).await;
        assert_eq!(registry.mode("91999").await, ChatMode::Manual);
    }

    #[tokio::test]
    async fn touch_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModeRegistry::open(dir.path().join("modes.json")).await;
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(registry.touch_contact("a", late).await, None);
        assert_eq!(registry.touch_contact("a", early).await, Some(late));
        assert_eq!(registry.touch_contact("a", late).await, Some(late));
    }
}
