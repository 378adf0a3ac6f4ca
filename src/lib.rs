//! The opa64 command line interface (CLI) crate.
//!
//! This crate implements the `opa64` tool, which parses the ARM reference
//! documents into a per-opcode database and links that database into the
//! instruction records shown by the viewer.

#![deny(missing_docs)]

pub mod commands;
pub mod config;

use crate::config::Config;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Options shared by the commands that read the configuration file.
#[derive(Parser, Clone, Debug, Default)]
pub struct CommonOptions {
    /// Use the specified configuration file instead of the default one
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CommonOptions {
    /// Installs the stderr logger, filtered by `OPA64_LOG`.
    pub fn init_logging(&self) {
        use std::io::IsTerminal;
        use tracing_subscriber::{EnvFilter, FmtSubscriber};
        FmtSubscriber::builder()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_env("OPA64_LOG"))
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    }

    /// Loads the configuration selected by `--config`, or the default one.
    pub fn config(&self) -> Result<Config> {
        Config::from_file(self.config.as_deref())
    }
}
