// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic completion adapter for the Parley messaging bridge.
//!
//! Implements [`CompletionProvider`] on top of the non-streaming Messages
//! API. Each call is a single user turn with its own system instruction.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use parley_config::model::LlmConfig;
use parley_core::traits::{CompletionProvider, PluginAdapter};
use parley_core::types::{AdapterType, CompletionRequest, HealthStatus};
use parley_core::ParleyError;
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic-backed text completion.
///
/// API key resolution order: config, then `ANTHROPIC_API_KEY`, else error.
pub struct AnthropicCompleter {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicCompleter {
    pub fn new(config: &LlmConfig) -> Result<Self, ParleyError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, "Anthropic completion adapter initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    #[cfg(test)]
    fn with_client(client: AnthropicClient) -> Self {
        Self {
            client,
            model: "claude-test".to_string(),
            max_tokens: 64,
        }
    }

    fn to_message_request(&self, request: CompletionRequest) -> MessageRequest {
        let system = Some(request.system_instruction).filter(|s| !s.trim().is_empty());
        MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::user(request.user_text)],
            system,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicCompleter {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        // Probing the API would spend tokens.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicCompleter {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ParleyError> {
        let api_request = self.to_message_request(request);
        let response = self.client.complete_message(&api_request).await?;

        let text = response.text().trim().to_string();
        debug!(
            id = %response.id,
            output_tokens = response.usage.output_tokens,
            "completion received"
        );
        if text.is_empty() {
            return Err(ParleyError::completion("model returned no text"));
        }
        Ok(text)
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, ParleyError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        ParleyError::Config(
            "Anthropic API key not found. Set llm.api_key in config or the ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}
