//! CLI command implementations
//!
//! `start` boots in a fixed order: configuration, logging, storage replay,
//! application, then the serving loop. Nothing is served before the store
//! has been replayed.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::json;

use crate::api::{base64_bytes, ApiHandler};
use crate::app::{BoxedEngine, KvStoreApplication};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::storage::{KvEngine, LogStore, MemoryStore};

use super::args::Command;
use super::config::{Config, StorageBackend};
use super::errors::{CliError, CliResult};
use super::io::{serve_lines, write_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
///
/// Stdout carries only command output; log lines go to stderr.
pub fn run_command(cmd: Command) -> CliResult<()> {
    Logger::route_all_to_stderr();
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
        Command::Query { config, key } => query(&config, &key),
        Command::Dump { config } => dump(&config),
    }
}

/// Initialize a new data directory
///
/// Creates `<data_dir>/data` and an empty log. Commits nothing.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let dir = data_dir.join("data");
    fs::create_dir_all(&dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
    })?;

    if config.storage_backend == StorageBackend::Log {
        LogStore::open(data_dir).map_err(|e| CliError::boot_failed(e.to_string()))?;
    }

    write_response(json!({"initialized": true}))?;

    Ok(())
}

/// Boot and serve JSON-line requests from stdin until EOF
///
/// Exits with an error when the application halts under the `halt` policy.
pub fn start(config_path: &Path) -> CliResult<()> {
    log_event(Event::BootStart);

    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", config.data_dir.as_str()),
            ("fatal_policy", config.fatal_policy.as_str()),
        ],
    );

    let app = boot_application(&config)?;
    let handler = ApiHandler::new(app);
    log_event(Event::BootComplete);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = serve_lines(&handler, stdin.lock(), stdout.lock())?;

    let requests = summary.requests.to_string();
    let metrics = handler
        .metrics()
        .and_then(|m| serde_json::to_string(&m).ok())
        .unwrap_or_default();
    log_event_with_fields(
        Event::ShutdownComplete,
        &[("requests", requests.as_str()), ("metrics", metrics.as_str())],
    );

    if summary.halted {
        let reason = handler
            .halt_reason()
            .unwrap_or_else(|| "application halted".to_string());
        return Err(CliError::halted(reason));
    }

    Ok(())
}

/// Read one key from the committed store and exit
///
/// Goes through the same dispatcher as `start`, so the output is the
/// serving loop's query response.
pub fn query(config_path: &Path, key: &str) -> CliResult<()> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_log_severity()?);

    let handler = ApiHandler::new(boot_application(&config)?);
    let request = json!({
        "type": "query",
        "data": base64_bytes::encode(key.as_bytes()),
    });

    let response = handler.handle(&request.to_string());
    write_json(&response.to_json())?;

    Ok(())
}

/// Print every committed entry in key order, one JSON line each
pub fn dump(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_log_severity()?);

    let engine = open_engine(&config)?;
    let entries = engine
        .iter_committed()
        .map_err(|e| CliError::boot_failed(e.to_string()))?;

    for (key, value) in &entries {
        write_json(
            &json!({
                "key": base64_bytes::encode(key),
                "value": base64_bytes::encode(value),
            })
            .to_string(),
        )?;
    }

    write_response(json!({
        "entries": entries.len(),
        "version": engine.version(),
    }))?;

    Ok(())
}

/// Open the configured engine and wrap it in the application
pub fn boot_application(config: &Config) -> CliResult<KvStoreApplication> {
    let engine = open_engine(config)?;
    Ok(KvStoreApplication::new(engine, config.fatal_policy)
        .with_gas_wanted(config.check_tx_gas_wanted))
}

/// Open the configured storage engine, replaying the log if durable
pub fn open_engine(config: &Config) -> CliResult<BoxedEngine> {
    match config.storage_backend {
        StorageBackend::Log => {
            let data_dir = config.data_path();
            if !is_initialized(data_dir) {
                return Err(CliError::not_initialized());
            }
            let store = LogStore::open(data_dir).map_err(|e| CliError::boot_failed(e.to_string()))?;
            Ok(Box::new(store))
        }
        StorageBackend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

/// Check if the data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("data").is_dir()
}
