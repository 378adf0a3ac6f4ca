//! The module for the opa64 CLI commands.

mod config;
mod parse;
mod relink;

pub use self::{config::*, parse::*, relink::*};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes `value` as pretty-printed JSON to `output`, or to stdout.
fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
