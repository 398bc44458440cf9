//! Command-line interface for sample-sorter.
//!
//! Commands classify names, organize folders and inspect pattern
//! documents. Settings from the config file fill in unset flags.

mod commands;

pub use commands::{Cli, Commands, run_command};
