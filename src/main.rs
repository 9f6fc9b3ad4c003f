//! Starknet Foundry Buildpack
//!
//! CLI entry point that dispatches to the detect and build phases.

use clap::Parser;
use console::style;
use starknet_foundry_buildpack::cli::{Cli, Commands};
use starknet_foundry_buildpack::error::BuildpackResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BuildpackResult<()> {
    let cli = Cli::parse();

    // BP_LOG_LEVEL=DEBUG is the platform-wide switch, -v flags work locally
    let debug_requested = std::env::var("BP_LOG_LEVEL")
        .map(|level| level.eq_ignore_ascii_case("debug"))
        .unwrap_or(false);
    let filter = match (cli.verbose, debug_requested) {
        (_, true) | (2.., _) => EnvFilter::new("starknet_foundry_buildpack=debug"),
        (1, _) => EnvFilter::new("starknet_foundry_buildpack=info"),
        _ => EnvFilter::new("starknet_foundry_buildpack=warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Detect(args) => starknet_foundry_buildpack::cli::commands::detect(args).await,
        Commands::Build(args) => {
            starknet_foundry_buildpack::cli::commands::build(args, cli.buildpack_dir).await
        }
    }
}
