//! Terminal front end over the lifecycle controller
//!
//! Interactive mode reads lines with rustyline and renders each record as
//! it moves from pending to settled. One-shot mode submits a single message
//! and prints the settled record.

mod render;
mod session;

pub use render::{render_history_line, render_metadata, render_pending, render_settled};
pub use session::ConsoleSession;

use eyre::{Context, Result};
use tracing::info;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::lifecycle::{LifecycleController, LifecycleRecord, RecordState};
use crate::session::SessionToken;

fn build_controller(config: &Config) -> Result<LifecycleController> {
    config.validate().context("Invalid configuration")?;
    LifecycleController::from_config(&config.orchestrator).map_err(|e| eyre::eyre!("Failed to create client: {}", e))
}

/// Run the interactive console
pub async fn run_interactive(config: &Config) -> Result<()> {
    let controller = build_controller(config)?;
    let endpoint = config.orchestrator.endpoint_url();
    info!(%endpoint, "run_interactive: starting console");

    let mut session = ConsoleSession::new(controller, endpoint, config.console.show_metadata);
    session.run().await
}

/// Submit one message and print the settled record
///
/// Returns the settled record so the caller can pick an exit status.
pub async fn send_once(config: &Config, message: &str, format: OutputFormat) -> Result<LifecycleRecord> {
    let controller = build_controller(config)?;
    let token = SessionToken::generate();

    let record = controller
        .submit(&token, message)
        .map_err(|e| eyre::eyre!("{}", e))?
        .settle()
        .await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => println!("{}", render_settled(&record, config.console.show_metadata)),
    }

    if record.state() == RecordState::Failed {
        info!(id = %record.id(), "send_once: request failed");
    }
    Ok(record)
}
