//! Typed results of the application calls

use crate::validation::TxCode;

/// Log text for a query that found its key
pub const QUERY_LOG_EXISTS: &str = "exists";
/// Log text for a query that did not
pub const QUERY_LOG_MISSING: &str = "does not exist";
/// Fixed SetOption reply
pub const SET_OPTION_LOG: &str = "No options are supported yet";

/// Answer to Info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub data: String,
    pub version: String,
    pub app_version: u64,
    /// Number of committed blocks
    pub last_block_height: i64,
    pub last_block_app_hash: Vec<u8>,
}

/// Answer to CheckTx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTxOutcome {
    pub code: TxCode,
    pub gas_wanted: i64,
}

/// Answer to Commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Opaque token returned to the engine; always empty
    pub data: Vec<u8>,
    /// Store version after the commit
    pub version: u64,
}

/// Answer to Query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

impl QueryOutcome {
    pub fn found(&self) -> bool {
        self.value.is_some()
    }

    pub fn log(&self) -> &'static str {
        if self.found() {
            QUERY_LOG_EXISTS
        } else {
            QUERY_LOG_MISSING
        }
    }
}

/// Answer to SetOption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOptionOutcome {
    pub code: u32,
    pub log: &'static str,
}

impl Default for SetOptionOutcome {
    fn default() -> Self {
        Self {
            code: 0,
            log: SET_OPTION_LOG,
        }
    }
}
