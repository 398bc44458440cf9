//! Sample Sorter - organizes audio sample libraries by file name.
//!
//! Samples are classified into a category taxonomy (DRUMS/KICK/LOOP, ...)
//! using configurable regex patterns and, when available, their duration.
//! Everything is driven from the CLI.

pub mod analyzer;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod organizer;
pub mod patterns;
pub mod processor;
pub mod report;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Log targets are module names ("processor", "cache"), so the default
    // level applies globally; RUST_LOG directives still narrow it
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    if !cli::run_command(&args)? {
        cli::Cli::command().print_help()?;
    }
    Ok(())
}
