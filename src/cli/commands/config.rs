use anyhow::Result;

use super::Command;
use crate::config::config;

/// Prints the configuration after defaults, file and environment are merged
#[derive(Debug, Default)]
pub struct ConfigCommand;

impl ConfigCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        print!("{}", config()?.to_redacted_toml()?);
        Ok(())
    }
}
