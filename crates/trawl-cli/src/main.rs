//! Trawl CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trawl_cli::cli::{Cli, Commands, Format};
use trawl_cli::commands::{ExtractCommand, SearchCommand};
use trawl_cli::output::OutputFormat;
use trawl_index::TrawlConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => TrawlConfig::from_file(path)
            .map_err(|e| anyhow!("loading {}: {e}", path.display()))?,
        None => TrawlConfig::default(),
    };
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Extract(args) => {
            let format = OutputFormat::new(Format::from_flag(args.json));
            ExtractCommand::new().execute(&mut stdout, &format, args)?;
        }
        Commands::Search(args) => {
            let format = OutputFormat::new(Format::from_flag(args.json));
            SearchCommand::new(&config)
                .execute(&mut stdout, &format, args)
                .await?;
        }
    }

    Ok(())
}
