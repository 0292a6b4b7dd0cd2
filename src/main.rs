use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cotacao::AppCommand;
use cotacao::core::log::init_logging;
use tokio::time::Instant;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Write the example configuration to the default location
    Setup,
    /// Serve the current quote on GET /cotacao
    Serve,
    /// Fetch the quote from the service and write it to the output file
    Fetch,
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Setup => AppCommand::Setup,
            Commands::Serve => AppCommand::Serve,
            Commands::Fetch => AppCommand::Fetch,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The client budget covers the whole run, argument parsing included.
    let started = Instant::now();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    init_logging(cli.verbose);
    let result = cotacao::run_command(command.into(), cli.config_path.as_deref(), started).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
