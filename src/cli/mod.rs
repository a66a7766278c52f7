//! CLI module for kvstore
//!
//! Provides command-line interface for:
//! - init: Create the data directory
//! - start: Boot and serve JSON-line requests on stdin/stdout
//! - query: One-shot committed read
//! - dump: Ordered scan of the committed store

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{boot_application, dump, init, open_engine, query, run, run_command, start};
pub use config::{Config, StorageBackend};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{serve_lines, write_json, write_response, ServeSummary};
