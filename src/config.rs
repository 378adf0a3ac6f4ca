//! Module for configuring the `opa64` tool.

use anyhow::{Context, Result, anyhow, bail};
use directories_next::ProjectDirs;
use log::trace;
use opa64_relink::Options;
use serde_derive::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The configuration file: one section per stage.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Tunables of the relink stage.
    #[serde(default)]
    pub relink: Options,
    /// Where the source documents live.
    #[serde(default)]
    pub documents: DocumentsConfig,
}

/// The `[documents]` section.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Directory the documents were downloaded to; `opa64 parse --dir`
    /// takes precedence.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

// if changed, update the template below
fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

const TEMPLATE: &str = "\
# Comment out certain settings to use default values.

[relink]
# merge-separator = \",\"
# vector-shuffle-opcodes = [\"zip\", \"uzp\", \"trn\"]

[documents]
# directory = \".\"
";

impl Config {
    /// Loads the configuration from `config_file`, or from the default
    /// location if `None` is passed.
    ///
    /// A missing default file yields the default configuration; a missing
    /// file that was asked for explicitly is an error.
    pub fn from_file(config_file: Option<&Path>) -> Result<Config> {
        let (config_file, user_custom_file) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !config_file.exists() && !user_custom_file {
            trace!("no config file at {}, using defaults", config_file.display());
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(&config_file)
            .with_context(|| format!("failed to read config file: {}", config_file.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_file.display()))
    }
}

/// Writes the commented template to `path`, or to the platform's default
/// location, and returns where it went.
///
/// An existing file is never touched.
pub fn create_new_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    trace!("writing configuration template to {}", path.display());

    if path.exists() {
        bail!(
            "{} already exists; edit it or pass another path to `opa64 config new`",
            path.display()
        );
    }
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create configuration directory {}", dir.display()))?;
    fs::write(&path, TEMPLATE)
        .with_context(|| format!("cannot write configuration template {}", path.display()))?;
    Ok(path)
}

fn default_config_path() -> Result<PathBuf> {
    match ProjectDirs::from("", "", "opa64") {
        Some(dirs) => Ok(dirs.config_dir().join("config.toml")),
        None => bail!("config file not specified and failed to get the default"),
    }
}
