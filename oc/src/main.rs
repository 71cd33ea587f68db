//! oc - Orchestrator console
//!
//! CLI entry point for the interactive console and one-shot sends.

use std::fs;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use orchconsole::cli::{Cli, Command, OutputFormat, get_log_path};
use orchconsole::config::Config;
use orchconsole::console;
use orchconsole::lifecycle::RecordState;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    // Load configuration, then let flags win over file and environment
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config.orchestrator.base_url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.orchestrator.timeout_ms = timeout_ms;
    }

    info!(
        "Console loaded config: endpoint={}, timeout_ms={}",
        config.orchestrator.endpoint_url(),
        config.orchestrator.timeout_ms
    );

    match cli.command {
        Some(Command::Send { message, format }) => cmd_send(&config, &message, format).await,
        Some(Command::Chat) | None => console::run_interactive(&config).await,
    }
}

/// Send one message; exit non-zero when the request failed
async fn cmd_send(config: &Config, message: &str, format: OutputFormat) -> Result<()> {
    let record = console::send_once(config, message, format).await?;
    if record.state() == RecordState::Failed {
        std::process::exit(1);
    }
    Ok(())
}
