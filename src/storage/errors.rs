//! Storage error types
//!
//! Error codes:
//! - KV_STORAGE_IO_ERROR (ERROR severity)
//! - KV_STORAGE_WRITE_FAILED (ERROR severity)
//! - KV_STORAGE_READ_FAILED (ERROR severity)
//! - KV_STORAGE_CONFLICT (ERROR severity)
//! - KV_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, process continues
    Error,
    /// The store can no longer be trusted
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    KvStorageIoError,
    /// Batch write or fsync failed
    KvStorageWriteFailed,
    /// Committed read failed
    KvStorageReadFailed,
    /// Staging transaction based on a stale version
    KvStorageConflict,
    /// Checksum or framing failure in the log
    KvDataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::KvStorageIoError => "KV_STORAGE_IO_ERROR",
            StorageErrorCode::KvStorageWriteFailed => "KV_STORAGE_WRITE_FAILED",
            StorageErrorCode::KvStorageReadFailed => "KV_STORAGE_READ_FAILED",
            StorageErrorCode::KvStorageConflict => "KV_STORAGE_CONFLICT",
            StorageErrorCode::KvDataCorruption => "KV_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::KvStorageIoError => Severity::Error,
            StorageErrorCode::KvStorageWriteFailed => Severity::Error,
            StorageErrorCode::KvStorageReadFailed => Severity::Error,
            StorageErrorCode::KvStorageConflict => Severity::Error,
            StorageErrorCode::KvDataCorruption => Severity::Fatal,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug)]
pub struct StorageError {
    /// Error code
    code: StorageErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::KvStorageIoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new storage write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::KvStorageWriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new storage read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::KvStorageReadFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a conflict error for a staging transaction opened at a stale version
    pub fn conflict(base_version: u64, current_version: u64) -> Self {
        Self {
            code: StorageErrorCode::KvStorageConflict,
            message: "Staging transaction is based on a stale version".to_string(),
            details: Some(format!(
                "base_version: {}, current_version: {}",
                base_version, current_version
            )),
            source: None,
        }
    }

    /// Create a new data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::KvDataCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::KvDataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error is fatal for the store itself
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageErrorCode::KvStorageIoError.code(), "KV_STORAGE_IO_ERROR");
        assert_eq!(StorageErrorCode::KvStorageWriteFailed.code(), "KV_STORAGE_WRITE_FAILED");
        assert_eq!(StorageErrorCode::KvStorageReadFailed.code(), "KV_STORAGE_READ_FAILED");
        assert_eq!(StorageErrorCode::KvStorageConflict.code(), "KV_STORAGE_CONFLICT");
        assert_eq!(StorageErrorCode::KvDataCorruption.code(), "KV_DATA_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::data_corruption("checksum mismatch").is_fatal());
        assert!(!StorageError::conflict(1, 2).is_fatal());
        assert!(!StorageError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        )
        .is_fatal());
    }

    #[test]
    fn test_error_display_contains_required_fields() {
        let err = StorageError::corruption_at_offset(1024, "checksum mismatch");
        let display = format!("{}", err);
        assert!(display.contains("KV_DATA_CORRUPTION"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("byte_offset: 1024"));
    }

    #[test]
    fn test_conflict_details() {
        let err = StorageError::conflict(3, 4);
        assert_eq!(err.details(), Some("base_version: 3, current_version: 4"));
    }
}
