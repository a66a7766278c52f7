//! In-memory engine with the same commit contract as `LogStore`, minus
//! durability.

use std::collections::BTreeMap;

use super::engine::{CommitInfo, KvEngine, ReadStore, StagingTxn};
use super::errors::StorageResult;

/// Volatile key-value engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
}

impl MemoryStore {
    /// Create an empty store at version 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.index.get(key).cloned())
    }
}

impl KvEngine for MemoryStore {
    fn version(&self) -> u64 {
        self.version
    }

    fn commit(&mut self, txn: StagingTxn) -> StorageResult<CommitInfo> {
        txn.check_base(self.version)?;
        let writes = txn.into_writes();
        let keys_written = writes.len();
        self.index.extend(writes);
        self.version += 1;
        Ok(CommitInfo {
            version: self.version,
            keys_written,
        })
    }

    fn iter_committed(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .index
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
