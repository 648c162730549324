use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Weave - static site assembler with fragment composition and incremental rebuilds
#[derive(Parser, Debug)]
#[command(name = "weave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for CI (NDJSON in watch mode)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root (where weave.toml lives)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the site once
    Build {
        #[command(flatten)]
        site: SiteArgs,

        /// Remove the output directory and cache before building
        #[arg(long)]
        clean: bool,

        /// Rebuild every page even when its output is fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Build, then rebuild incrementally as sources change
    Watch {
        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Overrides shared by every command.
#[derive(Args, Debug, Default)]
pub struct SiteArgs {
    /// Source directory (relative to the project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory (relative to the project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Treat missing fragments as page errors
    #[arg(long)]
    pub strict: bool,

    /// Write non-index pages as `name/index.html`
    #[arg(long)]
    pub pretty_urls: bool,
}
