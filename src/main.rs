use anyhow::Result;
use clap::Parser;

use cooking_assistant::cli::commands::{show_getting_started, Command, ConfigCommand, CookCommand};
use cooking_assistant::cli::{Cli, Commands};
use cooking_assistant::{config, init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?;
    init_telemetry(&config.observability)?;

    let result = match cli.command {
        // Default behavior: no subcommand - explain how to start cooking
        None => show_getting_started(),
        Some(Commands::Cook { offline }) => {
            tokio::runtime::Runtime::new()?.block_on(async { CookCommand::new(offline).execute().await })
        }
        Some(Commands::Config) => {
            tokio::runtime::Runtime::new()?.block_on(async { ConfigCommand::new().execute().await })
        }
    };

    shutdown_telemetry();
    result
}
