// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parley configuration system.

use std::io::Write;

use parley_config::diagnostic::{suggest_key, ConfigError};
use parley_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "desk"
log_level = "debug"

[gateway]
host = "0.0.0.0"
port = 8080
bearer_token = "secret"
event_buffer = 64

[storage]
data_dir = "/tmp/parley"
transcript_file = "t.json"
modes_file = "m.json"

[llm]
api_key = "sk-ant-test"
model = "claude-test"
max_tokens = 256
timeout_secs = 10

[bridge]
base_url = "http://localhost:9000"
token = "bridge-secret"
self_id = "15550001111@c.us"
bot_ids = ["1@bot"]
history_limit = 20

[assistant]
greeting_gap_secs = 60
max_reply_words = 10
utc_offset_minutes = 330

[sync]
enabled = false
interval_secs = 30
lookback_secs = 600
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "desk");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("secret"));
    assert_eq!(
        config.storage.transcript_path(),
        std::path::PathBuf::from("/tmp/parley/t.json")
    );
    assert_eq!(config.llm.model, "claude-test");
    assert_eq!(config.bridge.bot_ids, vec!["1@bot"]);
    assert_eq!(config.bridge.self_id.as_deref(), Some("15550001111@c.us"));
    assert_eq!(config.assistant.utc_offset_minutes, Some(330));
    assert!(!config.sync.enabled);
    assert_eq!(config.sync.lookback_secs, 600);
}

#[test]
fn empty_document_uses_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 3000);
    assert!(config.gateway.bearer_token.is_none());
    assert_eq!(config.llm.timeout_secs, 15);
    assert_eq!(config.assistant.greeting_gap_secs, 3 * 60 * 60);
    assert_eq!(config.assistant.max_reply_words, 25);
    assert_eq!(config.bridge.history_limit, 50);
    assert!(config.sync.enabled);
}

#[test]
fn unknown_key_is_rejected_with_suggestion() {
    let toml = r#"
[gateway]
bearer_tokn = "x"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "bearer_tokn");
            assert_eq!(suggestion.as_deref(), Some("bearer_token"));
            assert!(valid_keys.contains("event_buffer"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "gateway.port"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

#[test]
fn validation_runs_after_parse() {
    let toml = r#"
[sync]
interval_secs = 0

[assistant]
max_reply_words = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn suggestion_threshold() {
    assert_eq!(
        suggest_key("lookbak_secs", &["lookback_secs", "interval_secs"]),
        Some("lookback_secs".to_string())
    );
    assert_eq!(suggest_key("zzz", &["enabled"]), None);
}

#[test]
fn errors_render_through_miette() {
    let errors = load_and_validate_str("[llm]\nmodle = \"x\"\n").unwrap_err();
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    handler
        .render_report(&mut out, &errors[0] as &dyn miette::Diagnostic)
        .unwrap();
    assert!(out.contains("modle"));
    assert!(out.contains("parley::config::unknown_key"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[bridge]\nhistory_limit = 5\n\n[gateway]\nport = 4000").unwrap();

    // SAFETY: serialized with the other env-touching tests.
    unsafe {
        std::env::set_var("PARLEY_BRIDGE_HISTORY_LIMIT", "7");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("PARLEY_BRIDGE_HISTORY_LIMIT");
    }

    let config = result.expect("file plus env should load");
    assert_eq!(config.bridge.history_limit, 7);
    assert_eq!(config.gateway.port, 4000);
}
