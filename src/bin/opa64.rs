//! The `opa64` command line tool.
//!
//! Builds the cross-referenced AArch64 instruction database.
//! See `opa64 --help` for usage.

use anyhow::Result;
use clap::Parser;

/// AArch64 instruction knowledge base
#[derive(Parser)]
#[command(
    name = "opa64",
    version,
    after_help = "Usage examples:\n\
                  \n\
                  Parsing every downloaded document of the current directory:\n\
                  \n  \
                  opa64 parse -o opa64.db.json\n\
                  \n\
                  Parsing only the Cortex-A55 and Cortex-A72 latency tables:\n\
                  \n  \
                  opa64 parse --doc table.a55,table.a72 -o tables.db.json\n\
                  \n\
                  Linking a database into instruction records:\n\
                  \n  \
                  opa64 relink --db opa64.db.json -o opa64.json\n"
)]
struct Opa64 {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser)]
enum Subcommand {
    /// Parses the source documents into the unified database
    Parse(opa64_cli::commands::ParseCommand),

    /// Links a database into instruction records
    Relink(opa64_cli::commands::RelinkCommand),

    /// Controls opa64 configuration settings
    Config(opa64_cli::commands::ConfigCommand),
}

impl Opa64 {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        match self.subcommand {
            Subcommand::Parse(c) => c.execute(),
            Subcommand::Relink(c) => c.execute(),
            Subcommand::Config(c) => c.execute(),
        }
    }
}

fn main() -> Result<()> {
    Opa64::parse().execute()
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Opa64::command().debug_assert()
}
