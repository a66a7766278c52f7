//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::validation::TxCode;

/// Operational counters for the application.
///
/// All counters use Relaxed atomics; readers only need eventual values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Blocks opened by BeginBlock
    blocks_begun: AtomicU64,
    /// Blocks durably committed
    blocks_committed: AtomicU64,
    /// CheckTx calls answered with code 0
    check_tx_accepted: AtomicU64,
    /// DeliverTx calls answered with code 0
    deliver_tx_accepted: AtomicU64,
    /// Transactions rejected as malformed (CheckTx + DeliverTx)
    txs_malformed: AtomicU64,
    /// Transactions rejected as duplicate (CheckTx + DeliverTx)
    txs_duplicate: AtomicU64,
    /// Queries answered
    queries: AtomicU64,
    /// Internal faults surfaced to the caller
    internal_faults: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment blocks begun
    pub fn increment_blocks_begun(&self) {
        self.blocks_begun.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment blocks committed
    pub fn increment_blocks_committed(&self) {
        self.blocks_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a CheckTx outcome
    pub fn record_check_tx(&self, code: TxCode) {
        match code {
            TxCode::Ok => self.check_tx_accepted.fetch_add(1, Ordering::Relaxed),
            _ => self.record_rejection(code),
        };
    }

    /// Record a DeliverTx outcome
    pub fn record_deliver_tx(&self, code: TxCode) {
        match code {
            TxCode::Ok => self.deliver_tx_accepted.fetch_add(1, Ordering::Relaxed),
            _ => self.record_rejection(code),
        };
    }

    fn record_rejection(&self, code: TxCode) -> u64 {
        match code {
            TxCode::Malformed => self.txs_malformed.fetch_add(1, Ordering::Relaxed),
            TxCode::Duplicate => self.txs_duplicate.fetch_add(1, Ordering::Relaxed),
            TxCode::Ok => 0,
        }
    }

    /// Increment queries answered
    pub fn increment_queries(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment internal faults
    pub fn increment_internal_faults(&self) {
        self.internal_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_begun: self.blocks_begun.load(Ordering::Relaxed),
            blocks_committed: self.blocks_committed.load(Ordering::Relaxed),
            check_tx_accepted: self.check_tx_accepted.load(Ordering::Relaxed),
            deliver_tx_accepted: self.deliver_tx_accepted.load(Ordering::Relaxed),
            txs_malformed: self.txs_malformed.load(Ordering::Relaxed),
            txs_duplicate: self.txs_duplicate.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            internal_faults: self.internal_faults.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub blocks_begun: u64,
    pub blocks_committed: u64,
    pub check_tx_accepted: u64,
    pub deliver_tx_accepted: u64,
    pub txs_malformed: u64,
    pub txs_duplicate: u64,
    pub queries: u64,
    pub internal_faults: u64,
}
