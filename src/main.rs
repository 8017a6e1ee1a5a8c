//! bookforge - assemble self-contained mdBook books
//!
//! bookforge provides:
//! - `{{#include path:anchor}}` resolution with ANCHOR/ANCHOR_END markers
//! - Book assembly with generated book.toml and SUMMARY.md
//! - Multi-book builds from bookforge.toml
//! - Combined documentation output and anchor linting

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod anchors;
mod book;
mod cache;
mod cli;
mod config;
mod core;
mod flows;
mod include;

fn init_tracing(cli: &cli::Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(&cli);

    cli::run(cli)
}
