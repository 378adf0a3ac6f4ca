//! The module that implements the `opa64 config` command.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Controls opa64 configuration settings
#[derive(Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    subcommand: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Creates a new opa64 configuration file
    New(ConfigNewCommand),
}

impl ConfigCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        match self.subcommand {
            ConfigSubcommand::New(c) => c.execute(),
        }
    }
}

/// Creates a new opa64 configuration file
#[derive(Parser)]
pub struct ConfigNewCommand {
    /// The path of the new configuration file; the platform's configuration
    /// directory by default
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

impl ConfigNewCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        let path = crate::config::create_new_config(self.path.as_deref())?;

        println!("Wrote the opa64 configuration template to {}", path.display());

        Ok(())
    }
}
