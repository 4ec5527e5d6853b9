use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "cooking-assistant")]
#[command(about = "Conversational cooking assistant with recipe suggestions and step timers")]
#[command(long_about = "Tell the assistant how many people you are cooking for and what you have in the \
                       kitchen. It suggests recipes, scales the ingredients and walks you through each \
                       step with timers. Get started with 'cooking-assistant cook'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive cooking session
    Cook {
        /// Understand commands locally instead of asking the language model
        #[arg(long, help = "Use the built-in keyword interpreter ('next', 'timer 10 min', '2 eggs, rice')")]
        offline: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}
