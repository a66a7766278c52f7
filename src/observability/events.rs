//! Observable events
//!
//! Events are explicit and typed. The string form is what appears in the
//! `event` field of every log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in the application lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Serving loop finished
    ShutdownComplete,
    /// Configuration loaded
    ConfigLoaded,

    // Storage
    /// Store opened and replayed
    StoreOpened,
    /// Unfinished batch cut from the log tail
    StoreTailDiscarded,

    // Block lifecycle
    /// Chain initialized by the engine
    ChainInitialized,
    /// Staging transaction opened
    BlockBegin,
    /// Transaction rejected during delivery
    TxRejected,
    /// Block ended by the engine
    BlockEnd,
    /// Staging transaction committed
    BlockCommit,

    // Faults
    /// Internal fault surfaced to the caller
    InternalFault,
    /// Application halted after a fatal fault (FATAL)
    AppHalted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "KVSTORE_STARTUP_BEGIN",
            Event::BootComplete => "KVSTORE_STARTUP_COMPLETE",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::StoreOpened => "STORE_OPENED",
            Event::StoreTailDiscarded => "STORE_TAIL_DISCARDED",

            Event::ChainInitialized => "CHAIN_INITIALIZED",
            Event::BlockBegin => "BLOCK_BEGIN",
            Event::TxRejected => "TX_REJECTED",
            Event::BlockEnd => "BLOCK_END",
            Event::BlockCommit => "BLOCK_COMMIT",

            Event::InternalFault => "INTERNAL_FAULT",
            Event::AppHalted => "APP_HALTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::TxRejected => Severity::Trace,
            Event::StoreTailDiscarded => Severity::Warn,
            Event::InternalFault => Severity::Error,
            Event::AppHalted => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
