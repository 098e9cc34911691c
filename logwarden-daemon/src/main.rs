//! logwarden-daemon entry point.
//!
//! Lifecycle: parse CLI -> load config -> init tracing -> start the
//! security monitor -> wait for ctrl-c -> graceful stop (which emits the
//! final session report). Exit code is non-zero only when startup fails,
//! notably when the monitored log source cannot be opened at all.

use anyhow::Result;
use clap::Parser;

use logwarden_core::config::LogwardenConfig;
use logwarden_core::error::{ConfigError, LogwardenError};
use logwarden_core::pipeline::Pipeline;
use logwarden_daemon::cli::DaemonCli;
use logwarden_daemon::{logging, metrics_server};
use logwarden_monitor::config::PipelineConfig;
use logwarden_monitor::monitor::SecurityMonitorBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let (mut config, used_defaults) = load_config(&cli).await?;

    // CLI overrides win over env vars and the config file
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    logging::init_tracing(&config.general)?;

    if used_defaults {
        tracing::warn!(
            path = %cli.config.display(),
            "config file not found, running with built-in defaults"
        );
    }

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    tracing::info!("logwarden-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let mut monitor = SecurityMonitorBuilder::new()
        .config(PipelineConfig::from_core(&config))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build security monitor: {}", e))?;

    monitor
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start security monitor: {}", e))?;

    tracing::info!("logwarden-daemon running — monitoring active");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    if let Err(e) = monitor.stop().await {
        tracing::error!(error = %e, "failed to stop security monitor");
    }

    tracing::info!("logwarden-daemon shut down");
    Ok(())
}

/// Load configuration, falling back to defaults when the default config
/// path does not exist. An explicitly passed path must exist.
async fn load_config(cli: &DaemonCli) -> Result<(LogwardenConfig, bool)> {
    match LogwardenConfig::load(&cli.config).await {
        Ok(config) => Ok((config, false)),
        Err(LogwardenError::Config(ConfigError::FileNotFound { .. }))
            if !cli.config_is_explicit() =>
        {
            let mut config = LogwardenConfig::default();
            config.apply_env_overrides();
            Ok((config, true))
        }
        Err(e) => Err(anyhow::anyhow!(
            "failed to load config {}: {}",
            cli.config.display(),
            e
        )),
    }
}
