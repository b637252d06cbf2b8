//! Meta-Factory CLI entry point.

use clap::Parser;

use meta_factory::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => meta_factory::cli::commands::run::execute(args, cli.json).await,
        Commands::Config(args) => meta_factory::cli::commands::config::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        meta_factory::cli::handle_error(err, cli.json);
    }
}
