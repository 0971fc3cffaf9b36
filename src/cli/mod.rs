//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod output;

pub use commands::{ConfigSubcommand, ScanOptions, handle_config_command, run_scan};
pub use logging::*;
