pub mod cli;
pub mod client;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::Deadline;
use crate::core::config::AppConfig;
use anyhow::Result;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Write the example configuration to the default location
    Setup,
    /// Run the quote service until shut down
    Serve,
    /// Ask the service for the current quote once and write the artifact
    Fetch,
}

/// Runs `command`. `started` is when the process started; the client budget
/// is measured from it.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    started: Instant,
) -> Result<()> {
    match command {
        AppCommand::Setup => {
            let path = cli::setup::setup()?;
            info!(path = %path.display(), "Setup complete");
            Ok(())
        }
        AppCommand::Serve => server::start(&load_config(config_path)?).await,
        AppCommand::Fetch => {
            let config = load_config(config_path)?;
            let deadline = Deadline::since(started, config.timeouts.client_timeout());
            let client = client::QuoteClient::new(&config.client)?;
            let path = client.run(deadline).await?;
            info!(path = %path.display(), "Fetch complete");
            Ok(())
        }
    }
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}
