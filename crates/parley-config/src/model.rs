// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley messaging bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP/WebSocket gateway for the web client.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Transcript and mode registry files.
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM completion settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Browser-automation sidecar settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Assistant voice and reply shaping.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Reconciliation sync settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on every authenticated route. `None` rejects all requests.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Capacity of the viewer fan-out channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_event_buffer() -> usize {
    256
}

/// Storage file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the JSON store files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Transcript file name inside `data_dir`.
    #[serde(default = "default_transcript_file")]
    pub transcript_file: String,

    /// Mode registry file name inside `data_dir`.
    #[serde(default = "default_modes_file")]
    pub modes_file: String,
}

impl StorageConfig {
    pub fn transcript_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.transcript_file)
    }

    pub fn modes_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.modes_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            transcript_file: default_transcript_file(),
            modes_file: default_modes_file(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("parley"))
        .unwrap_or_else(|| PathBuf::from("parley-data"))
        .to_string_lossy()
        .into_owned()
}

fn default_transcript_file() -> String {
    "transcripts.json".to_string()
}

fn default_modes_file() -> String {
    "modes.json".to_string()
}

/// LLM completion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for rewrites and automatic replies.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Upper bound on a single completion call.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    15
}

/// Browser-automation sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Base URL of the sidecar HTTP API.
    #[serde(default = "default_bridge_url")]
    pub base_url: String,

    /// Shared secret sent as a bearer token to the sidecar.
    #[serde(default)]
    pub token: Option<String>,

    /// Jid of this account, used when chasing composite message ids.
    #[serde(default)]
    pub self_id: Option<String>,

    /// Sender jids of bot accounts whose replies arrive as placeholders first.
    #[serde(default = "default_bot_ids")]
    pub bot_ids: Vec<String>,

    /// Number of recent messages fetched per chat for sync and bot scans.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// HTTP timeout for sidecar calls.
    #[serde(default = "default_bridge_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            token: None,
            self_id: None,
            bot_ids: default_bot_ids(),
            history_limit: default_history_limit(),
            timeout_secs: default_bridge_timeout_secs(),
        }
    }
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:21465".to_string()
}

fn default_bot_ids() -> Vec<String> {
    vec![
        "13135550002@c.us".to_string(),
        "867051314767696@bot".to_string(),
    ]
}

fn default_history_limit() -> usize {
    50
}

fn default_bridge_timeout_secs() -> u64 {
    20
}

/// Assistant voice configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// Instruction used when no training text has been saved.
    #[serde(default = "default_instruction")]
    pub default_instruction: String,

    /// Self-identification appended to the greeting of a fresh exchange.
    #[serde(default = "default_identity_line")]
    pub identity_line: String,

    /// Silence after which the next automatic reply opens with a greeting.
    #[serde(default = "default_greeting_gap_secs")]
    pub greeting_gap_secs: u64,

    /// Automatic replies longer than this many words are truncated.
    #[serde(default = "default_max_reply_words")]
    pub max_reply_words: usize,

    /// Fixed wall-clock offset for schedules and greetings. Local time when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_instruction: default_instruction(),
            identity_line: default_identity_line(),
            greeting_gap_secs: default_greeting_gap_secs(),
            max_reply_words: default_max_reply_words(),
            utc_offset_minutes: None,
        }
    }
}

fn default_instruction() -> String {
    "You reply to chat messages on behalf of the account owner. \
     Be friendly, brief, and natural. Never claim to be the owner in person."
        .to_string()
}

fn default_identity_line() -> String {
    "This is the owner's assistant replying while they are away.".to_string()
}

fn default_greeting_gap_secs() -> u64 {
    3 * 60 * 60
}

fn default_max_reply_words() -> usize {
    25
}

/// Reconciliation sync configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Run the periodic sync task.
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,

    /// Seconds between periodic sync runs.
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,

    /// How far back a conversation seen for the first time is scanned.
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
            interval_secs: default_sync_interval_secs(),
            lookback_secs: default_lookback_secs(),
        }
    }
}

fn default_sync_enabled() -> bool {
    true
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_lookback_secs() -> u64 {
    60 * 60
}
