//! API error types
//!
//! API errors are pass-through: application and storage faults keep their
//! original code and severity. Only malformed requests get API codes.

use std::fmt;

use crate::app::AppError;

/// API error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request failed, the application is intact
    Error,
    /// The fault is unrecoverable for the caller
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request is not valid JSON or misses a field
    KvInvalidRequest,
    /// `type` names no known call
    KvUnknownOperation,
    /// The dispatcher lock was poisoned by a panic
    KvLockPoisoned,
}

impl ApiErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::KvInvalidRequest => "KV_INVALID_REQUEST",
            ApiErrorCode::KvUnknownOperation => "KV_UNKNOWN_OPERATION",
            ApiErrorCode::KvLockPoisoned => "KV_LOCK_POISONED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            ApiErrorCode::KvInvalidRequest => Severity::Error,
            ApiErrorCode::KvUnknownOperation => Severity::Error,
            ApiErrorCode::KvLockPoisoned => Severity::Fatal,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved subsystem error information
#[derive(Debug)]
pub struct ApiError {
    /// Original error code string (from subsystem or API)
    code: String,
    /// Error message
    message: String,
    /// Severity
    severity: Severity,
}

impl ApiError {
    fn from_code(code: ApiErrorCode, message: String) -> Self {
        Self {
            code: code.code().to_string(),
            message,
            severity: code.severity(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::from_code(ApiErrorCode::KvInvalidRequest, reason.into())
    }

    /// Create an unknown operation error
    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::from_code(
            ApiErrorCode::KvUnknownOperation,
            format!("Unknown operation: {}", op.into()),
        )
    }

    /// Create a poisoned-lock error
    pub fn lock_poisoned() -> Self {
        Self::from_code(
            ApiErrorCode::KvLockPoisoned,
            "A previous request panicked while holding the dispatcher lock".to_string(),
        )
    }

    /// Create from an application error (pass-through)
    pub fn from_app_error(err: AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            severity: if err.is_fatal() {
                Severity::Fatal
            } else {
                Severity::Error
            },
        }
    }

    /// Returns the error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Fatal)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::from_app_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
