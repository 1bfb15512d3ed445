// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` and `parley sync` command implementations.
//!
//! Opens the JSON stores, connects the sidecar bridge and the Anthropic
//! completer, assembles the agent, then serves the gateway until a
//! shutdown signal arrives. The periodic reconciliation sync runs
//! alongside the server on the same cancellation token.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::shutdown;
use parley_agent::{Clock, ParleyAgent, WallClock};
use parley_anthropic::AnthropicCompleter;
use parley_bridge::BridgeClient;
use parley_config::ParleyConfig;
use parley_core::{CompletionProvider, MessagingProvider, ParleyError};
use parley_gateway::{start_server, GatewayState, ServerConfig};
use parley_storage::{ModeRegistry, TranscriptStore};
use tracing::{error, info, warn};

/// Builds the agent over the real adapters.
async fn build_agent(config: &ParleyConfig) -> Result<ParleyAgent, ParleyError> {
    let store = Arc::new(TranscriptStore::open(config.storage.transcript_path()).await);
    let registry = Arc::new(ModeRegistry::open(config.storage.modes_path()).await);

    let provider: Arc<dyn MessagingProvider> = Arc::new(BridgeClient::new(&config.bridge)?);
    let completer: Arc<dyn CompletionProvider> = Arc::new(
        AnthropicCompleter::new(&config.llm).map_err(|e| {
            error!(error = %e, "failed to initialize Anthropic completer");
            eprintln!(
                "error: Anthropic API key required. Set via: config llm.api_key or ANTHROPIC_API_KEY env var"
            );
            e
        })?,
    );
    let clock: Arc<dyn Clock> = Arc::new(WallClock::new(config.assistant.utc_offset_minutes));

    Ok(ParleyAgent::new(
        config, provider, completer, store, registry, clock,
    ))
}

/// Runs the `parley serve` command.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.agent.log_level);

    info!("starting parley serve");

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set; every API request will be rejected");
    }

    let agent = build_agent(&config).await?;
    let cancel = shutdown::install_signal_handler();

    if config.sync.enabled {
        let interval = Duration::from_secs(config.sync.interval_secs);
        let sync = Arc::clone(&agent.sync);
        let sync_cancel = cancel.clone();
        tokio::spawn(async move {
            sync.run_periodic(interval, sync_cancel).await;
        });
        info!(interval_secs = config.sync.interval_secs, "periodic sync enabled");
    } else {
        info!("periodic sync disabled by configuration");
    }

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let state = GatewayState::new(agent.clone(), config.gateway.bearer_token.clone());

    let served = start_server(&server_config, state, cancel.clone()).await;

    // Stop background work if the server exited on its own.
    cancel.cancel();
    agent.shutdown().await;
    served?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Runs the `parley sync` command: one reconciliation pass, report on stdout.
pub async fn run_sync_once(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.agent.log_level);

    let agent = build_agent(&config).await?;
    let report = agent
        .sync
        .run_once()
        .await
        .ok_or_else(|| ParleyError::Internal("a sync pass is already running".into()))?;

    agent.shutdown().await;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| ParleyError::Internal(format!("failed to encode sync report: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Initializes the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
