//! What the application does after an internal fault

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deployment policy for internal faults.
///
/// A fault during the block lifecycle (DeliverTx read, Commit write,
/// protocol violation) always stops block processing: the staging
/// transaction is gone and cannot be trusted. The policy only decides
/// whether read-only calls keep being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Any internal fault halts the application; every later call fails
    #[default]
    Halt,
    /// Read faults fail only their own request; after a lifecycle fault,
    /// Info, CheckTx and Query are still served
    ServeReads,
}

/// Whether a call drives the block lifecycle or only reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Lifecycle,
    Read,
}

impl FatalPolicy {
    /// Does a fault raised by a call of `kind` halt the application?
    pub fn halts_on(self, kind: CallKind) -> bool {
        match (self, kind) {
            (_, CallKind::Lifecycle) => true,
            (FatalPolicy::Halt, CallKind::Read) => true,
            (FatalPolicy::ServeReads, CallKind::Read) => false,
        }
    }

    /// May a halted application still answer a call of `kind`?
    pub fn serves_when_halted(self, kind: CallKind) -> bool {
        self == FatalPolicy::ServeReads && kind == CallKind::Read
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FatalPolicy::Halt => "halt",
            FatalPolicy::ServeReads => "serve_reads",
        }
    }
}

impl FromStr for FatalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "halt" => Ok(FatalPolicy::Halt),
            "serve_reads" => Ok(FatalPolicy::ServeReads),
            other => Err(format!(
                "Invalid fatal_policy: '{}'. Must be 'halt' or 'serve_reads'.",
                other
            )),
        }
    }
}

impl fmt::Display for FatalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_faults_always_halt() {
        assert!(FatalPolicy::Halt.halts_on(CallKind::Lifecycle));
        assert!(FatalPolicy::ServeReads.halts_on(CallKind::Lifecycle));
    }

    #[test]
    fn test_read_faults_depend_on_policy() {
        assert!(FatalPolicy::Halt.halts_on(CallKind::Read));
        assert!(!FatalPolicy::ServeReads.halts_on(CallKind::Read));
    }

    #[test]
    fn test_halted_reads() {
        assert!(!FatalPolicy::Halt.serves_when_halted(CallKind::Read));
        assert!(FatalPolicy::ServeReads.serves_when_halted(CallKind::Read));
        assert!(!FatalPolicy::ServeReads.serves_when_halted(CallKind::Lifecycle));
    }

    #[test]
    fn test_parse_and_serde_agree() {
        let parsed: FatalPolicy = "serve_reads".parse().unwrap();
        let from_json: FatalPolicy = serde_json::from_str("\"serve_reads\"").unwrap();
        assert_eq!(parsed, from_json);
        assert!("crash".parse::<FatalPolicy>().is_err());
    }
}
