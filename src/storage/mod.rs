//! Key-value storage subsystem
//!
//! Holds the committed state the application reads and writes through.
//!
//! # Design Principles
//!
//! - Append-only log, no in-place updates
//! - Checksum-verified on every replayed record
//! - A block's writes become visible together, at commit
//! - Halt on corruption: a damaged log refuses to open
//!
//! Two engines implement `KvEngine`: `LogStore` (durable) and
//! `MemoryStore` (volatile).

mod checksum;
mod engine;
mod errors;
mod log_store;
mod memory;
mod reader;
mod record;
mod writer;

pub use checksum::compute_checksum;
pub use engine::{CommitInfo, KvEngine, ReadStore, StagingTxn};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use log_store::LogStore;
pub use memory::MemoryStore;
pub use reader::{LogReader, ReadStep};
pub use record::LogRecord;
pub use writer::{log_path, LogWriter, LOG_FILE_NAME};
