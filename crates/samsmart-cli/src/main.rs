mod cli;
mod commands;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{FetchArgs, MergeArgs, cmd_check, cmd_fetch, cmd_merge};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet mode suppresses info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = util::config_path(cli.config.as_ref());

    match cli.command {
        Commands::Check => cmd_check(&config_path, cli.quiet),
        Commands::Fetch { household, table } => {
            cmd_fetch(FetchArgs {
                config_path: &config_path,
                household: &household,
                table: &table,
            })
            .await
        }
        Commands::Merge { files, table } => cmd_merge(MergeArgs {
            config_path: &config_path,
            explicit_config: cli.config.is_some(),
            files: &files,
            table: &table,
        }),
    }
}
