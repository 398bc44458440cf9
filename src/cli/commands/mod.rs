//! CLI command definitions and dispatch.
//!
//! Each subcommand lives in its own submodule:
//! - `classify`: Classify file names without touching disk
//! - `organize`: Sort a sample folder into the taxonomy
//! - `patterns`: Validate a pattern document and print its taxonomy
//! - `settings`: Write the default settings file

mod classify;
mod organize;
mod patterns;
mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::patterns::PatternRegistry;

pub use classify::cmd_classify;
pub use organize::{OrganizeArgs, cmd_organize};
pub use patterns::{cmd_check_patterns, cmd_tree};
pub use settings::cmd_init_config;

/// Sample Sorter CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify sample file names and print the decisions
    Classify {
        /// File names to classify
        #[arg(required = true)]
        names: Vec<String>,
        /// Duration in seconds applied to every name
        #[arg(short, long)]
        duration: Option<f64>,
        /// Pattern document (default: settings, then built-in)
        #[arg(short, long)]
        patterns: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Organize a sample folder into the category taxonomy
    Organize(OrganizeArgs),
    /// Validate a pattern document
    CheckPatterns {
        /// Pattern document (default: settings, then built-in)
        file: Option<PathBuf>,
    },
    /// Print every directory of the output taxonomy
    Tree {
        /// Pattern document (default: settings, then built-in)
        #[arg(short, long)]
        patterns: Option<PathBuf>,
    },
    /// Write the default settings file
    InitConfig {
        /// Replace an existing settings file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
///
/// Returns `Ok(true)` if a command was run, `Ok(false)` if no command was
/// specified.
pub fn run_command(cli: &Cli) -> anyhow::Result<bool> {
    let Some(command) = &cli.command else {
        return Ok(false);
    };

    let settings = crate::config::load();
    match command {
        Commands::Classify {
            names,
            duration,
            patterns,
            json,
        } => cmd_classify(&settings, names, *duration, patterns.as_deref(), *json)?,
        Commands::Organize(args) => cmd_organize(&settings, args)?,
        Commands::CheckPatterns { file } => cmd_check_patterns(&settings, file.as_deref())?,
        Commands::Tree { patterns } => cmd_tree(&settings, patterns.as_deref())?,
        Commands::InitConfig { force } => cmd_init_config(*force)?,
    }
    Ok(true)
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Build the pattern registry from an explicit file, the settings file, or
/// the built-in document, in that order.
pub(crate) fn load_registry(
    settings: &Config,
    explicit: Option<&Path>,
) -> anyhow::Result<Arc<PatternRegistry>> {
    let registry = match explicit.or(settings.paths.patterns_file.as_deref()) {
        Some(path) => PatternRegistry::from_file(path)
            .with_context(|| format!("Invalid pattern document {}", path.display()))?,
        None => PatternRegistry::embedded().context("Built-in patterns are invalid")?,
    };
    Ok(Arc::new(registry))
}
