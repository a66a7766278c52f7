//! Application fault types
//!
//! Transaction rejections are `TxCode`s, never errors. Everything here is an
//! internal fault: the current request is aborted and is not retryable.
//! Whether the application keeps serving afterwards is decided by
//! `FatalPolicy`.

use thiserror::Error;

use crate::storage::{Severity, StorageError};

/// Result type for application calls
pub type AppResult<T> = Result<T, AppError>;

/// Internal faults raised by the application
#[derive(Debug, Error)]
pub enum AppError {
    /// BeginBlock arrived while a staging transaction was still open
    #[error("BeginBlock at height {height} while block at height {open_height} is still open")]
    BlockAlreadyOpen { height: i64, open_height: i64 },

    /// DeliverTx, EndBlock or Commit arrived with no open block
    #[error("{call} called with no open block")]
    NoOpenBlock { call: &'static str },

    /// The storage engine failed underneath a call
    #[error("storage failure during {call}: {source}")]
    Storage {
        call: &'static str,
        /// The fault stopped block processing
        halted: bool,
        #[source]
        source: StorageError,
    },

    /// A previous fatal fault stopped the application
    #[error("application halted: {reason}")]
    Halted { reason: String },
}

impl AppError {
    /// Wrap a storage error raised during `call`
    pub fn storage(call: &'static str, source: StorageError) -> Self {
        AppError::Storage {
            call,
            halted: false,
            source,
        }
    }

    /// Mark a storage fault as one that halted the application
    pub fn into_halting(self) -> Self {
        match self {
            AppError::Storage { call, source, .. } => AppError::Storage {
                call,
                halted: true,
                source,
            },
            other => other,
        }
    }

    /// Stable string code. Storage faults keep the storage code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BlockAlreadyOpen { .. } => "KV_APP_BLOCK_ALREADY_OPEN",
            AppError::NoOpenBlock { .. } => "KV_APP_NO_OPEN_BLOCK",
            AppError::Storage { source, .. } => source.code().code(),
            AppError::Halted { .. } => "KV_APP_HALTED",
        }
    }

    /// Protocol violations and halts are FATAL. A storage fault is FATAL
    /// when it halted the application, otherwise it keeps the storage
    /// severity.
    pub fn severity(&self) -> Severity {
        match self {
            AppError::Storage { halted: true, .. } => Severity::Fatal,
            AppError::Storage { source, .. } => source.severity(),
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// True when the caller broke the begin/deliver/commit protocol
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            AppError::BlockAlreadyOpen { .. } | AppError::NoOpenBlock { .. }
        )
    }
}
