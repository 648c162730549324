//! Weave CLI - static site assembler
//!
//! Usage: weave <COMMAND>
//!
//! Commands:
//!   build   Build the site once
//!   watch   Build, then rebuild incrementally as sources change

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::build::cmd_build;
use crate::commands::watch::cmd_watch;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Build { site, clean, force } => {
            cmd_build(&cli.root, site, *clean, *force, cli.json)
        }
        Commands::Watch { site } => cmd_watch(&cli.root, site, cli.json),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
