mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use replayflow_browser::PlaywrightRunner;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = config::CliConfig::load();

    init_tracing(cli.verbose);
    tracing::debug!(config = ?config, "loaded CLI config");

    let format = cli.format;
    let result = match cli.command {
        Commands::Generate(args) => commands::generate::run(args, &config, format),
        Commands::Run(args) => {
            commands::run::run(&PlaywrightRunner::new(), args, &config, format).await
        }
        Commands::Quick(args) => {
            commands::quick::run(&PlaywrightRunner::new(), args, &config, format).await
        }
        Commands::Probe => commands::probe::run(&PlaywrightRunner::new(), format).await,
    };

    if let Err(err) = result {
        error::handle_error(err);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "replayflow=debug,info"
    } else {
        "replayflow=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
