// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`ParleyAgent`] with mock adapters,
//! a manual clock and JSON stores in a temp directory. Provides
//! `receive()` and `send()` to drive the pipeline and the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::{Clock, ParleyAgent};
use parley_config::ParleyConfig;
use parley_core::{ChatMode, Message, ParleyError, ProviderEvent};
use parley_storage::{ModeRegistry, TranscriptStore};
use serde_json::Value;

use crate::clock::ManualClock;
use crate::mock_completion::MockCompletion;
use crate::mock_messenger::MockMessenger;

/// Monday morning, 10:30 in UTC.
pub const DEFAULT_NOW: &str = "2025-01-06T10:30:00+00:00";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    llm_delay: Option<Duration>,
    now: String,
    config: ParleyConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            llm_delay: None,
            now: DEFAULT_NOW.to_string(),
            config: ParleyConfig::default(),
        }
    }

    /// Set mock LLM responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Delay every LLM answer.
    pub fn with_llm_delay(mut self, delay: Duration) -> Self {
        self.llm_delay = Some(delay);
        self
    }

    /// Start the clock at an RFC 3339 instant.
    pub fn at(mut self, now: &str) -> Self {
        self.now = now.to_string();
        self
    }

    /// Adjust the configuration before the agent is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut ParleyConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir = tempfile::TempDir::new().map_err(ParleyError::storage)?;
        let mut config = self.config;
        config.storage.data_dir = temp_dir.path().to_string_lossy().to_string();

        let store = Arc::new(TranscriptStore::open(config.storage.transcript_path()).await);
        let registry = Arc::new(ModeRegistry::open(config.storage.modes_path()).await);

        let messenger = Arc::new(MockMessenger::new());
        let mut completion = MockCompletion::with_responses(self.responses);
        if let Some(delay) = self.llm_delay {
            completion = completion.with_delay(delay);
        }
        let completion = Arc::new(completion);

        let clock = Arc::new(
            chrono::DateTime::parse_from_rfc3339(&self.now)
                .map(ManualClock::new)
                .map_err(|e| ParleyError::Config(format!("invalid harness clock: {e}")))?,
        );

        let agent = ParleyAgent::new(
            &config,
            messenger.clone(),
            completion.clone(),
            store,
            registry,
            clock.clone() as Arc<dyn Clock>,
        );

        Ok(TestHarness {
            messenger,
            completion,
            clock,
            agent,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub messenger: Arc<MockMessenger>,
    pub completion: Arc<MockCompletion>,
    pub clock: Arc<ManualClock>,
    pub agent: ParleyAgent,
    pub config: ParleyConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Feeds a raw provider event through the pipeline.
    pub async fn receive(&self, event: Value) -> Option<Message> {
        self.agent
            .pipeline
            .handle_event(ProviderEvent::new(event))
            .await
    }

    /// Sends user-typed text through the dispatcher.
    pub async fn send(&self, conversation: &str, text: &str) -> Result<Vec<Message>, ParleyError> {
        self.agent.dispatcher.send(conversation, text).await
    }

    pub async fn set_mode(&self, conversation: &str, mode: ChatMode) {
        self.agent.registry.set_mode(conversation, mode).await;
    }

    /// Stored transcript of `conversation`.
    pub async fn messages(&self, conversation: &str) -> Vec<Message> {
        self.agent.store.messages(conversation).await
    }

    /// Unix seconds of the harness clock, for provider event `t` fields.
    pub fn unix_now(&self) -> i64 {
        self.clock.now_utc().timestamp()
    }
}
