// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bridged - integration bridge daemon entrypoint.

use std::path::PathBuf;
use std::process::ExitCode;

use bridge_daemon::{env, lifecycle, LifecycleError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bridged", version, about = "Integration bridge daemon")]
struct Cli {
    /// Path to the TOML config file. Defaults to `BRIDGE_CONFIG` or `bridge.toml`.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run as a subprocess worker: read envelopes from stdin and dispatch
    /// them, instead of starting the supervised daemon. This is the mode
    /// `production.mode=true` re-invokes this same binary with.
    #[arg(long = "worker")]
    worker: bool,
}

async fn run_worker(cli: Cli) -> Result<(), LifecycleError> {
    let config_path = cli.config.unwrap_or_else(env::config_path);
    let text = std::fs::read_to_string(&config_path)
        .map_err(|e| LifecycleError::Other(format!("failed to read {}: {e}", config_path.display())))?;
    let config = bridge_core::Config::from_toml_str(&text)
        .map_err(|e| LifecycleError::Other(format!("invalid config at {}: {e}", config_path.display())))?;
    let tables = lifecycle::load_tables(&config, std::sync::Arc::new(bridge_engine::HandlerRegistry::new()))?;
    bridge_engine::run_subprocess_worker(tokio::io::stdin(), tables)
        .await
        .map_err(|e| LifecycleError::Other(format!("subprocess worker failed: {e}")))
}

fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(env::log_filter())).init();
}

async fn run(cli: Cli) -> Result<(), LifecycleError> {
    let config_path = cli.config.unwrap_or_else(env::config_path);
    let text = std::fs::read_to_string(&config_path)
        .map_err(|e| LifecycleError::Other(format!("failed to read {}: {e}", config_path.display())))?;
    let config = bridge_core::Config::from_toml_str(&text)
        .map_err(|e| LifecycleError::Other(format!("invalid config at {}: {e}", config_path.display())))?;

    if !config.bridge_enabled {
        tracing::info!("bridge.enabled is false, exiting cleanly");
        return Ok(());
    }

    let started = lifecycle::startup(&config).await?;
    tracing::info!("bridge daemon started");

    started.supervisor.run_until_shutdown().await;

    tracing::info!("shutdown requested, stopping");
    started.execution_manager.stop().await;
    started.supervisor.clone().stop().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = if cli.worker { run_worker(cli).await } else { run(cli).await };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "bridge daemon failed to start");
            ExitCode::FAILURE
        }
    }
}
