//! The module that implements the `opa64 parse` command.

use crate::CommonOptions;
use anyhow::Result;
use clap::Parser;
use log::{error, info};
use opa64_relink::Database;
use opa64_sources::{JsonPages, parse_document, resolve};
use std::path::PathBuf;

/// Parses the source documents into the unified database.
///
/// Documents that are missing or cannot be read are reported and left out;
/// the database is written with whatever could be parsed.
#[derive(Parser)]
pub struct ParseCommand {
    #[command(flatten)]
    common: CommonOptions,

    /// Directory holding the downloaded documents
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Documents to parse: `all`, `description`, `intrinsics`, `table` or
    /// `table.<arch>`, comma separated; every document by default
    #[arg(long = "doc", value_name = "SPEC")]
    docs: Vec<String>,

    /// Write the database to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ParseCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.config()?;
        let dir = self.dir.unwrap_or(config.documents.directory);

        let mut db = Database::new();
        for doc in resolve(&self.docs) {
            match doc.and_then(|doc| parse_document(doc, &dir, &JsonPages)) {
                Ok(parsed) => parsed.merge_into(&mut db),
                Err(e) => error!("{:#}", anyhow::Error::new(e)),
            }
        }
        info!("database holds {} opcodes", db.len());

        super::write_json(self.output.as_deref(), &db)
    }
}
