// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a messaging bridge with manual, assisted and autonomous replies.
//!
//! This is the binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::{ConfigError, ParleyConfig};

/// Parley - a messaging bridge with manual, assisted and autonomous replies.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway, webhook and background sync (default).
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
    /// Run one reconciliation pass against the provider and exit.
    Sync,
}

fn load(path: Option<&PathBuf>) -> Result<ParleyConfig, Vec<ConfigError>> {
    match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    }
}

/// Human-readable configuration summary. Secrets are reported as set or unset only.
fn config_summary(config: &ParleyConfig) -> String {
    let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
    let mut out = String::new();
    out.push_str(&format!("agent.name        = {}\n", config.agent.name));
    out.push_str(&format!(
        "gateway           = {}:{} (bearer token {})\n",
        config.gateway.host,
        config.gateway.port,
        set(&config.gateway.bearer_token)
    ));
    out.push_str(&format!(
        "storage           = {} | {}\n",
        config.storage.transcript_path().display(),
        config.storage.modes_path().display()
    ));
    out.push_str(&format!(
        "llm.model         = {} (api key {})\n",
        config.llm.model,
        set(&config.llm.api_key)
    ));
    out.push_str(&format!("bridge.base_url   = {}\n", config.bridge.base_url));
    out.push_str(&format!(
        "sync              = {} every {}s, lookback {}s\n",
        if config.sync.enabled { "enabled" } else { "disabled" },
        config.sync.interval_secs,
        config.sync.lookback_secs
    ));
    out
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CheckConfig => {
            print!("{}", config_summary(&config));
            println!("configuration OK");
            Ok(())
        }
        Commands::Sync => serve::run_sync_once(config).await,
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parses_subcommands_and_config_path() {
        let cli = Cli::try_parse_from(["parley", "check-config", "--config", "/tmp/p.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config.unwrap(), PathBuf::from("/tmp/p.toml"));

        let cli = Cli::try_parse_from(["parley", "sync"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Sync)));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = parley_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, ParleyConfig::default().agent.name);
    }

    #[test]
    fn summary_never_prints_secrets() {
        let mut config = ParleyConfig::default();
        config.gateway.bearer_token = Some("super-secret".into());
        config.llm.api_key = Some("sk-ant-secret".into());

        let summary = config_summary(&config);
        assert!(!summary.contains("super-secret"));
        assert!(!summary.contains("sk-ant-secret"));
        assert!(summary.contains("bearer token set"));
        assert!(summary.contains("api key set"));
    }
}
