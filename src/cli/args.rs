//! CLI argument definitions using clap
//!
//! Commands:
//! - kvstore init --config <path>
//! - kvstore start --config <path>
//! - kvstore query --config <path> --key <key>
//! - kvstore dump --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kvstore - a key=value state machine driven by a consensus engine
#[derive(Parser, Debug)]
#[command(name = "kvstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./kvstore.json")]
        config: PathBuf,
    },

    /// Open the store and serve JSON-line requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./kvstore.json")]
        config: PathBuf,
    },

    /// Read one key from the committed store and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./kvstore.json")]
        config: PathBuf,

        /// Key to look up, as UTF-8 text
        #[arg(long)]
        key: String,
    },

    /// Print every committed entry in key order
    Dump {
        /// Path to configuration file
        #[arg(long, default_value = "./kvstore.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
