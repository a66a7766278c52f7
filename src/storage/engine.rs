//! Storage engine contract
//!
//! The application never holds a private copy of the store. It reads the
//! committed state through `ReadStore`, stages block writes in a
//! `StagingTxn`, and hands the transaction back to `KvEngine::commit`, which
//! makes every staged write visible at once or none of them.

use std::collections::BTreeMap;

use super::errors::{StorageError, StorageResult};

/// Read-only view of the committed store.
pub trait ReadStore {
    /// Returns the committed value for `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;
}

/// Result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    /// Store version after the commit
    pub version: u64,
    /// Number of distinct keys written
    pub keys_written: usize,
}

/// Transactional, ordered key-value engine.
pub trait KvEngine: ReadStore {
    /// Number of batches committed so far.
    fn version(&self) -> u64;

    /// Commits every write of `txn` as a single durable unit.
    fn commit(&mut self, txn: StagingTxn) -> StorageResult<CommitInfo>;

    /// All committed entries in key order.
    fn iter_committed(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Opens a staging transaction against the current committed version.
    fn begin(&self) -> StagingTxn {
        StagingTxn::new(self.version())
    }
}

/// Isolated write set for one block.
///
/// Writes are invisible to `ReadStore` readers until the owning engine
/// commits the transaction. The last write for a key wins.
#[derive(Debug, Default)]
pub struct StagingTxn {
    base_version: u64,
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
    set_calls: usize,
}

impl StagingTxn {
    /// Create an empty staging transaction based on `base_version`.
    pub fn new(base_version: u64) -> Self {
        Self {
            base_version,
            writes: BTreeMap::new(),
            set_calls: 0,
        }
    }

    /// Committed version this transaction was opened against.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Stage `key -> value`.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.writes.insert(key.into(), value.into());
        self.set_calls += 1;
    }

    /// Staged value for `key`, if any.
    pub fn get_staged(&self, key: &[u8]) -> Option<&[u8]> {
        self.writes.get(key).map(|v| v.as_slice())
    }

    /// Number of distinct staged keys.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of `set` calls, including overwrites of the same key.
    pub fn set_calls(&self) -> usize {
        self.set_calls
    }

    /// Checks that the transaction can be applied on top of `current_version`.
    pub fn check_base(&self, current_version: u64) -> StorageResult<()> {
        if self.base_version != current_version {
            return Err(StorageError::conflict(self.base_version, current_version));
        }
        Ok(())
    }

    /// Consumes the transaction, yielding its writes in key order.
    pub fn into_writes(self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.writes
    }
}
