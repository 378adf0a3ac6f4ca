//! The module that implements the `opa64 relink` command.

use crate::CommonOptions;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use opa64_relink::{Database, relink};
use std::fs;
use std::path::PathBuf;

/// Links intrinsics, descriptions and latency rows into instruction records.
#[derive(Parser)]
pub struct RelinkCommand {
    #[command(flatten)]
    common: CommonOptions,

    /// The database written by `opa64 parse`
    #[arg(long, value_name = "FILE")]
    db: PathBuf,

    /// Write the records to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl RelinkCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.config()?;

        let contents = fs::read_to_string(&self.db)
            .with_context(|| format!("failed to read database: {}", self.db.display()))?;
        let db: Database = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse database: {}", self.db.display()))?;

        let records = relink(&db, &config.relink);
        info!("{} opcodes linked into {} records", db.len(), records.len());

        super::write_json(self.output.as_deref(), &records)
    }
}
