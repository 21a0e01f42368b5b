//! Command-line interface for recordforge.
//!
//! One subcommand per record domain, plus `domains` to list them.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands, CommonArgs, ServiceArgs};
