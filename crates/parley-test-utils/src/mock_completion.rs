// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM adapter for deterministic testing.
//!
//! `MockCompletion` implements `CompletionProvider` with pre-configured
//! outcomes, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::traits::{CompletionProvider, PluginAdapter};
use parley_core::types::{AdapterType, CompletionRequest, HealthStatus};
use parley_core::ParleyError;

/// A mock completion provider.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockCompletion {
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl MockCompletion {
    /// Create a new mock with an empty queue.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a mock pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            outcomes: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::new()
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Err(message.into()));
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ParleyError> {
        self.requests.lock().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcomes.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ParleyError::completion(message)),
            None => Ok("mock response".to_string()),
        }
    }
}
