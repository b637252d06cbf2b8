//! CLI type definitions
//!
//! Top-level clap parser. Each subcommand's arguments live next to its
//! implementation under `commands/`.

use clap::{Parser, Subcommand};

use super::commands::config::ConfigArgs;
use super::commands::run::RunArgs;

/// Command-line entry point.
#[derive(Parser, Debug)]
#[command(name = "meta-factory")]
#[command(about = "Meta-Factory - critic-gated agent swarm for consulting engagements", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline over an engagement input file
    Run(RunArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::config::ConfigCommands;
    use crate::domain::models::run::PipelineMode;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "meta-factory",
            "run",
            "--mode",
            "greyfield",
            "--input",
            "acme.yaml",
            "--budget",
            "2.5",
            "--no-ensemble",
            "--output-dir",
            "out",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.mode, PipelineMode::Greyfield);
        assert_eq!(args.input, PathBuf::from("acme.yaml"));
        assert_eq!(args.budget, Some(2.5));
        assert!(args.no_ensemble);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_ingestion_with_documents() {
        let cli = Cli::try_parse_from([
            "meta-factory",
            "run",
            "--mode",
            "ingestion",
            "--input",
            "acme.yaml",
            "--documents",
            "kickoff.md",
            "rfp.pdf.txt",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.mode, PipelineMode::Ingestion);
        assert_eq!(
            args.documents,
            vec![PathBuf::from("kickoff.md"), PathBuf::from("rfp.pdf.txt")]
        );
    }

    #[test]
    fn test_run_requires_mode_and_input() {
        assert!(Cli::try_parse_from(["meta-factory", "run", "--input", "acme.yaml"]).is_err());
        assert!(Cli::try_parse_from(["meta-factory", "run", "--mode", "greenfield"]).is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let parsed = Cli::try_parse_from(["meta-factory", "run", "--mode", "bluefield", "--input", "a.yaml"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["meta-factory", "config", "show", "--config", "custom.yaml"]).unwrap();
        let Commands::Config(args) = cli.command else {
            panic!("expected config command");
        };
        let ConfigCommands::Show { config } = args.command;
        assert_eq!(config, Some(PathBuf::from("custom.yaml")));
    }
}
