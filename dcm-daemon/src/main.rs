use anyhow::{Context, Result};
use clap::Parser;
use dcm_core::config::DEFAULT_CONFIG_PATH;
use dcm_core::{init_observability, ComposeApplier, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod api;
mod orchestrator;
#[cfg(test)]
mod test_support;

use orchestrator::ComposeOrchestrator;

#[derive(Parser)]
#[command(name = "dcmd")]
#[command(about = "Docker Compose Manager daemon", long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    init_observability(&config.log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        compose = %config.docker_path.display(),
        port = config.port,
        command = ?config.compose_command,
        "DCM daemon starting"
    );

    let applier = Arc::new(ComposeApplier::new(&config.compose_command));
    let orchestrator = Arc::new(ComposeOrchestrator::new(&config, applier));

    let mut api_handle = tokio::spawn(api::start_api_server(orchestrator, config.port));

    tokio::select! {
        result = &mut api_handle => {
            result.context("HTTP API task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal");
            api_handle.abort();
            let _ = api_handle.await;
        }
    }

    info!("DCM daemon shutting down");
    Ok(())
}
