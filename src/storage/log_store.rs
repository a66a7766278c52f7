//! Durable engine backed by the append-only store log
//!
//! On open the log is replayed into an ordered in-memory index. Only puts
//! closed by a commit marker are applied. Puts trailing the last commit
//! marker belong to a batch that never finished and are cut off, as is a
//! final record torn by a crash mid-write. Damage anywhere before the last
//! commit marker fails the open.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use super::engine::{CommitInfo, KvEngine, ReadStore, StagingTxn};
use super::errors::{StorageError, StorageResult};
use super::reader::{LogReader, ReadStep};
use super::record::LogRecord;
use super::writer::{log_path, LogWriter};
use crate::observability::{log_event_with_fields, Event};

/// Log-backed key-value engine.
pub struct LogStore {
    writer: LogWriter,
    index: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
}

/// State recovered from replaying the log.
struct Replayed {
    index: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
    /// Offset just past the last commit marker
    committed_end: u64,
    discarded_puts: usize,
    /// A record cut short by end of file followed the last commit marker
    torn_tail: bool,
}

impl LogStore {
    /// Opens the store under `data_dir`, replaying committed batches.
    ///
    /// # Errors
    ///
    /// `KV_DATA_CORRUPTION` if any record fails verification, a torn
    /// record hides later commits, or commit versions are not strictly
    /// sequential.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let path = log_path(data_dir);
        let replayed = if path.exists() {
            Self::replay(&path)?
        } else {
            Replayed {
                index: BTreeMap::new(),
                version: 0,
                committed_end: 0,
                discarded_puts: 0,
                torn_tail: false,
            }
        };

        if replayed.discarded_puts > 0 || replayed.torn_tail {
            Self::truncate_to(&path, replayed.committed_end)?;
            let discarded = replayed.discarded_puts.to_string();
            let offset = replayed.committed_end.to_string();
            let torn = replayed.torn_tail.to_string();
            log_event_with_fields(
                Event::StoreTailDiscarded,
                &[
                    ("discarded_puts", discarded.as_str()),
                    ("torn_record", torn.as_str()),
                    ("offset", offset.as_str()),
                ],
            );
        }

        let writer = LogWriter::open(data_dir)?;

        let keys = replayed.index.len().to_string();
        let version = replayed.version.to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[("keys", keys.as_str()), ("version", version.as_str())],
        );

        Ok(Self {
            writer,
            index: replayed.index,
            version: replayed.version,
        })
    }

    fn replay(path: &Path) -> StorageResult<Replayed> {
        let mut reader = LogReader::open(path)?;
        let mut index = BTreeMap::new();
        let mut pending: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        let mut version = 0u64;
        let mut committed_end = 0u64;
        let mut torn_tail = false;

        loop {
            let record = match reader.read_step()? {
                ReadStep::Record(record) => record,
                ReadStep::End => break,
                ReadStep::TornTail { offset, reason } => {
                    Self::ensure_no_commit_after(path, offset, &reason)?;
                    torn_tail = true;
                    break;
                }
            };
            match record {
                LogRecord::Put { key, value } => pending.push((key, value)),
                LogRecord::Commit { version: committed } => {
                    if committed != version + 1 {
                        return Err(StorageError::corruption_at_offset(
                            reader.current_offset(),
                            format!(
                                "Commit version {} does not follow version {}",
                                committed, version
                            ),
                        ));
                    }
                    for (key, value) in pending.drain(..) {
                        index.insert(key, value);
                    }
                    version = committed;
                    committed_end = reader.current_offset();
                }
            }
        }

        Ok(Replayed {
            index,
            version,
            committed_end,
            discarded_puts: pending.len(),
            torn_tail,
        })
    }

    /// A torn record is only a crashed write if nothing committed follows it.
    /// A commit marker past `offset` means a damaged length hid committed data.
    fn ensure_no_commit_after(path: &Path, offset: u64, reason: &str) -> StorageResult<()> {
        let contents = fs::read(path)
            .map_err(|e| StorageError::read_failed("Failed to re-read log tail", e))?;
        let tail = contents.get(offset as usize..).unwrap_or_default();

        let hides_commit = (0..tail.len()).any(|start| {
            matches!(
                LogRecord::deserialize(&tail[start..]),
                Ok((LogRecord::Commit { .. }, _))
            )
        });

        if hides_commit {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!("{}; committed records follow the damage", reason),
            ));
        }
        Ok(())
    }

    fn truncate_to(path: &Path, len: u64) -> StorageResult<()> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            StorageError::io_error(format!("Failed to open log for truncation: {}", path.display()), e)
        })?;
        file.set_len(len)
            .map_err(|e| StorageError::io_error("Failed to truncate unfinished batch", e))?;
        file.sync_all()
            .map_err(|e| StorageError::io_error("fsync failed after truncation", e))
    }

    /// Number of committed keys.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }
}

impl ReadStore for LogStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.index.get(key).cloned())
    }
}

impl KvEngine for LogStore {
    fn version(&self) -> u64 {
        self.version
    }

    fn commit(&mut self, txn: StagingTxn) -> StorageResult<CommitInfo> {
        txn.check_base(self.version)?;

        let next_version = self.version + 1;
        let writes = txn.into_writes();
        let mut records: Vec<LogRecord> = writes
            .iter()
            .map(|(k, v)| LogRecord::put(k.clone(), v.clone()))
            .collect();
        records.push(LogRecord::commit(next_version));

        self.writer.append_batch(&records)?;

        let keys_written = writes.len();
        self.index.extend(writes);
        self.version = next_version;

        Ok(CommitInfo {
            version: next_version,
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
