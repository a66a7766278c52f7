//! Transaction response codes

use std::fmt;

/// Outcome of validating a transaction.
///
/// Returned to the caller as a plain integer; these are expected outcomes,
/// never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TxCode {
    /// Accepted
    Ok = 0,
    /// Not exactly one `=`
    Malformed = 1,
    /// The committed store already holds this exact pair
    Duplicate = 2,
}

impl TxCode {
    /// Wire value of the code
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns true for `TxCode::Ok`
    pub fn is_ok(self) -> bool {
        self == TxCode::Ok
    }

    /// Short lowercase name, used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            TxCode::Ok => "ok",
            TxCode::Malformed => "malformed",
            TxCode::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for TxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
