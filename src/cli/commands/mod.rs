use anyhow::Result;

pub mod config;
pub mod cook;

pub use config::ConfigCommand;
pub use cook::{run_session, CookCommand};

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

pub fn show_getting_started() -> Result<()> {
    println!("🍳 Cooking Assistant - recipes from what you have, step by step");
    println!();
    println!("To get started:");
    println!("  🥕 cooking-assistant cook            # Start cooking with the language model");
    println!("  ⌨️  cooking-assistant cook --offline  # Use simple typed commands instead");
    println!("  ⚙️  cooking-assistant config          # Show the effective configuration");
    println!();
    println!("💡 Set OPENAI_API_KEY (or llm.api_key in cooking-assistant.toml) before cooking.");
    Ok(())
}
