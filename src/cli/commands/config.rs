//! Configuration CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::domain::models::config::Config;
use crate::infrastructure::config::ConfigLoader;

/// Arguments of `meta-factory config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config action to run
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config actions.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration after all sources are merged
    Show {
        /// Load configuration from this file instead of .meta-factory/
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Render `config` as pretty JSON or YAML. The API key is never included.
pub fn render(config: &Config, json_mode: bool) -> Result<String> {
    if json_mode {
        serde_json::to_string_pretty(config).context("Failed to serialize configuration as JSON")
    } else {
        serde_yaml::to_string(config).context("Failed to serialize configuration as YAML")
    }
}

/// Run a config action.
pub async fn execute(args: ConfigArgs, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show { config } => {
            let config = match config {
                Some(path) => ConfigLoader::load_from_file(path)?,
                None => ConfigLoader::load()?,
            };
            println!("{}", render(&config, json_mode)?);
        }
    }
    Ok(())
}
