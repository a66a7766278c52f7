//! Log writer with fsync enforcement
//!
//! A committed batch is written with a single `write_all` followed by
//! `sync_all`. A batch is not acknowledged unless both succeed.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::LogRecord;

/// Log file name inside `<data_dir>/data/`
pub const LOG_FILE_NAME: &str = "kvstore.log";

/// Returns the log path for a data directory.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join(LOG_FILE_NAME)
}

/// Append-only writer for the store log.
pub struct LogWriter {
    /// Path to the log file
    log_path: PathBuf,
    /// Underlying file handle
    file: File,
    /// Current file offset
    current_offset: u64,
}

impl LogWriter {
    /// Opens or creates `<data_dir>/data/kvstore.log`, creating parent
    /// directories if needed.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let data_subdir = data_dir.join("data");
        let log_path = log_path(data_dir);

        if !data_subdir.exists() {
            fs::create_dir_all(&data_subdir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create data directory: {}", data_subdir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open store log: {}", log_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::write_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            log_path,
            file,
            current_offset,
        })
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Returns the current file offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a batch of records as one write and fsyncs it.
    ///
    /// Returns the byte offset where the batch starts.
    pub fn append_batch(&mut self, records: &[LogRecord]) -> StorageResult<u64> {
        let mut buf = Vec::new();
        for record in records {
            buf.extend_from_slice(&record.serialize());
        }
        let offset = self.current_offset;

        self.file.write_all(&buf).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to append batch of {} records", records.len()),
                e,
            )
        })?;

        self.file.sync_all().map_err(|e| {
            StorageError::write_failed("fsync failed after appending batch", e)
        })?;

        self.current_offset += buf.len() as u64;

        Ok(offset)
    }
}
