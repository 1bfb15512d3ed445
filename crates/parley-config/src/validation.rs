// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Widest real-world UTC offset, in minutes (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Validates a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.gateway.event_buffer == 0 {
        fail("gateway.event_buffer must be greater than zero".to_string());
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        fail("gateway.bearer_token must not be blank when set".to_string());
    }

    if config.storage.data_dir.trim().is_empty() {
        fail("storage.data_dir must not be empty".to_string());
    }
    if config.storage.transcript_file.trim().is_empty() {
        fail("storage.transcript_file must not be empty".to_string());
    }
    if config.storage.modes_file.trim().is_empty() {
        fail("storage.modes_file must not be empty".to_string());
    }
    if config.storage.transcript_file == config.storage.modes_file {
        fail("storage.transcript_file and storage.modes_file must differ".to_string());
    }

    let base_url = config.bridge.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "bridge.base_url `{base_url}` must start with http:// or https://"
        ));
    }
    if config.bridge.timeout_secs == 0 {
        fail("bridge.timeout_secs must be greater than zero".to_string());
    }
    if config.bridge.history_limit == 0 {
        fail("bridge.history_limit must be greater than zero".to_string());
    }

    if config.llm.model.trim().is_empty() {
        fail("llm.model must not be empty".to_string());
    }
    if config.llm.max_tokens == 0 {
        fail("llm.max_tokens must be greater than zero".to_string());
    }
    if config.llm.timeout_secs == 0 {
        fail("llm.timeout_secs must be greater than zero".to_string());
    }

    if config.assistant.max_reply_words == 0 {
        fail("assistant.max_reply_words must be greater than zero".to_string());
    }
    if let Some(offset) = config.assistant.utc_offset_minutes
        && offset.abs() > MAX_UTC_OFFSET_MINUTES
    {
        fail(format!(
            "assistant.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {offset}"
        ));
    }

    if config.sync.interval_secs == 0 {
        fail("sync.interval_secs must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
