//! Command-line interface for Vigil
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Vigil - host resource monitor with webhook alerting
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "vigil.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run one resource-monitoring cycle (sample, alert, recover, reverify)
    Check {
        /// Simulate alerts, recovery commands and notifications
        #[arg(long)]
        test: bool,
    },

    /// Run one network reachability check
    Network {
        /// Simulate notifications and report even when the network is up
        #[arg(long)]
        test: bool,
    },

    /// Validate the effective configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "vigil", &mut std::io::stdout());
    }
}
