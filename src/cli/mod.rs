//! CLI module - Command-line interface for Cinedex
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Cinedex - media catalog API
/// Browse, rate and track movies and shows stored in a Supabase project
#[derive(Parser)]
#[command(name = "cinedex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web")]
    Serve,

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create config.toml with default values
    #[command(alias = "--init")]
    Init,

    /// Validate the effective configuration and print a summary
    Check,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["cinedex", "config", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Check
            })
        ));

        let cli = Cli::try_parse_from(["cinedex"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["cinedex", "web"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }
}
