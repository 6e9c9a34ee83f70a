//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Playstyle analytics service for the snake game.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short = 'c', long = "config", env = "PLAYSTYLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do. Serves the socket protocol when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the socket protocol until interrupted.
    Serve,
    /// Run one analysis over the event store and print it.
    Analyze {
        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Create the event store schema if it does not exist yet.
    InitDb,
}

impl Arguments {
    /// The subcommand to run.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
