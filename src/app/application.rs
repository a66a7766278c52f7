//! The key=value state machine
//!
//! `KvStoreApplication` owns the storage engine, the block state and the
//! fatal policy. Every boundary call is a method here; the API handler only
//! decodes, locks and encodes.
//!
//! Validation always reads the committed store. The open block's writes are
//! invisible to CheckTx, DeliverTx and Query until Commit.

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::KvEngine;
use crate::validation::{validate, KvTx, TxCode};

use super::block::{BlockPhase, BlockState};
use super::errors::{AppError, AppResult};
use super::outcome::{AppInfo, CheckTxOutcome, CommitOutcome, QueryOutcome, SetOptionOutcome};
use super::policy::{CallKind, FatalPolicy};
use super::snapshot::{
    ApplyChunkOutcome, OfferSnapshotResult, Snapshot, SnapshotProvider, UnsupportedSnapshots,
};

/// Gas reported for every CheckTx
pub const DEFAULT_GAS_WANTED: i64 = 1;

/// Storage engine as held by the application
pub type BoxedEngine = Box<dyn KvEngine + Send>;

/// The application object driven by the consensus engine.
pub struct KvStoreApplication {
    engine: BoxedEngine,
    block: BlockState,
    policy: FatalPolicy,
    halted: Option<String>,
    gas_wanted: i64,
    snapshots: Box<dyn SnapshotProvider + Send>,
    metrics: MetricsRegistry,
}

impl KvStoreApplication {
    /// Wrap an opened engine
    pub fn new(engine: BoxedEngine, policy: FatalPolicy) -> Self {
        Self {
            engine,
            block: BlockState::new(),
            policy,
            halted: None,
            gas_wanted: DEFAULT_GAS_WANTED,
            snapshots: Box::new(UnsupportedSnapshots),
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn with_gas_wanted(mut self, gas_wanted: i64) -> Self {
        self.gas_wanted = gas_wanted;
        self
    }

    pub fn with_snapshot_provider(mut self, provider: Box<dyn SnapshotProvider + Send>) -> Self {
        self.snapshots = provider;
        self
    }

    pub fn policy(&self) -> FatalPolicy {
        self.policy
    }

    pub fn phase(&self) -> BlockPhase {
        self.block.phase()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Why the application halted, if it did
    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Committed block count as reported by Info
    pub fn last_block_height(&self) -> i64 {
        i64::try_from(self.engine.version()).unwrap_or(i64::MAX)
    }

    // ------------------------------------------------------------------
    // Connection-level calls
    // ------------------------------------------------------------------

    pub fn info(&self) -> AppResult<AppInfo> {
        self.ensure_serving(CallKind::Read)?;
        Ok(AppInfo {
            data: String::new(),
            version: String::new(),
            app_version: 0,
            last_block_height: self.last_block_height(),
            last_block_app_hash: Vec::new(),
        })
    }

    pub fn set_option(&self, _key: &str, _value: &str) -> AppResult<SetOptionOutcome> {
        self.ensure_serving(CallKind::Read)?;
        Ok(SetOptionOutcome::default())
    }

    /// Genesis parameters are accepted and ignored.
    pub fn init_chain(&mut self, chain_id: &str) -> AppResult<()> {
        self.ensure_serving(CallKind::Lifecycle)?;
        let version = self.engine.version().to_string();
        log_event_with_fields(
            Event::ChainInitialized,
            &[("chain_id", chain_id), ("version", version.as_str())],
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Block lifecycle
    // ------------------------------------------------------------------

    /// Opens the staging transaction for a block.
    pub fn begin_block(&mut self, height: i64) -> AppResult<()> {
        self.ensure_serving(CallKind::Lifecycle)?;

        let txn = self.engine.begin();
        if let Err(err) = self.block.begin(height, txn) {
            return Err(self.fail(CallKind::Lifecycle, err));
        }

        self.metrics.increment_blocks_begun();
        let height_str = height.to_string();
        let base_str = self.engine.version().to_string();
        log_event_with_fields(
            Event::BlockBegin,
            &[("height", height_str.as_str()), ("base_version", base_str.as_str())],
        );
        Ok(())
    }

    /// Mempool admission. Reads the committed store only.
    pub fn check_tx(&mut self, tx: &[u8]) -> AppResult<CheckTxOutcome> {
        self.ensure_serving(CallKind::Read)?;

        match validate(tx, self.engine.as_ref()) {
            Ok(code) => {
                self.metrics.record_check_tx(code);
                Ok(CheckTxOutcome {
                    code,
                    gas_wanted: self.gas_wanted,
                })
            }
            Err(err) => Err(self.fail(CallKind::Read, AppError::storage("check_tx", err))),
        }
    }

    /// Re-validates `tx` and stages its write when accepted.
    ///
    /// Rejections return their code and leave the block open. Two identical
    /// transactions in one block are both accepted since neither is
    /// committed when the second is validated.
    pub fn deliver_tx(&mut self, tx: &[u8]) -> AppResult<TxCode> {
        self.ensure_serving(CallKind::Lifecycle)?;

        if self.block.phase() == BlockPhase::Idle {
            let err = AppError::NoOpenBlock { call: "deliver_tx" };
            return Err(self.fail(CallKind::Lifecycle, err));
        }

        let code = match validate(tx, self.engine.as_ref()) {
            Ok(code) => code,
            Err(err) => {
                return Err(self.fail(CallKind::Lifecycle, AppError::storage("deliver_tx", err)))
            }
        };
        self.metrics.record_deliver_tx(code);

        let block = self.block.open_mut("deliver_tx")?;

        match (code, KvTx::parse(tx)) {
            (TxCode::Ok, Some(parsed)) => {
                block.txn.set(parsed.key, parsed.value);
                block.accepted += 1;
            }
            _ => {
                block.rejected += 1;
                let height_str = block.height.to_string();
                let code_str = code.as_u32().to_string();
                log_event_with_fields(
                    Event::TxRejected,
                    &[
                        ("height", height_str.as_str()),
                        ("code", code_str.as_str()),
                        ("reason", code.as_str()),
                    ],
                );
            }
        }

        Ok(code)
    }

    /// Acknowledgment only; the block stays open until Commit.
    pub fn end_block(&mut self, height: i64) -> AppResult<()> {
        self.ensure_serving(CallKind::Lifecycle)?;

        let height_str = height.to_string();
        match self.block.open_ref("end_block") {
            Ok(block) => {
                let accepted = block.accepted.to_string();
                let rejected = block.rejected.to_string();
                log_event_with_fields(
                    Event::BlockEnd,
                    &[
                        ("height", height_str.as_str()),
                        ("accepted", accepted.as_str()),
                        ("rejected", rejected.as_str()),
                    ],
                );
            }
            Err(_) => {
                log_event_with_fields(
                    Event::BlockEnd,
                    &[("height", height_str.as_str()), ("open", "false")],
                );
            }
        }
        Ok(())
    }

    /// Durably commits the staging transaction as one unit.
    ///
    /// The staging transaction is consumed whether or not the commit
    /// succeeds. A failed commit halts the application.
    pub fn commit(&mut self) -> AppResult<CommitOutcome> {
        self.ensure_serving(CallKind::Lifecycle)?;

        let block = match self.block.take("commit") {
            Ok(block) => block,
            Err(err) => return Err(self.fail(CallKind::Lifecycle, err)),
        };
        let height = block.height;

        let info = match self.engine.commit(block.txn) {
            Ok(info) => info,
            Err(err) => return Err(self.fail(CallKind::Lifecycle, AppError::storage("commit", err))),
        };

        self.metrics.increment_blocks_committed();
        let height_str = height.to_string();
        let version_str = info.version.to_string();
        let keys_str = info.keys_written.to_string();
        log_event_with_fields(
            Event::BlockCommit,
            &[
                ("height", height_str.as_str()),
                ("version", version_str.as_str()),
                ("keys_written", keys_str.as_str()),
            ],
        );

        Ok(CommitOutcome {
            data: Vec::new(),
            version: info.version,
        })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Point read against the committed store.
    pub fn query(&mut self, key: &[u8]) -> AppResult<QueryOutcome> {
        self.ensure_serving(CallKind::Read)?;
        self.metrics.increment_queries();

        match self.engine.get(key) {
            Ok(value) => Ok(QueryOutcome {
                key: key.to_vec(),
                value,
            }),
            Err(err) => Err(self.fail(CallKind::Read, AppError::storage("query", err))),
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn list_snapshots(&self) -> AppResult<Vec<Snapshot>> {
        self.ensure_serving(CallKind::Read)?;
        Ok(self.snapshots.list_snapshots())
    }

    pub fn offer_snapshot(
        &mut self,
        snapshot: &Snapshot,
        app_hash: &[u8],
    ) -> AppResult<OfferSnapshotResult> {
        self.ensure_serving(CallKind::Lifecycle)?;
        Ok(self.snapshots.offer_snapshot(snapshot, app_hash))
    }

    pub fn load_snapshot_chunk(&self, height: u64, format: u32, chunk: u32) -> AppResult<Vec<u8>> {
        self.ensure_serving(CallKind::Read)?;
        Ok(self.snapshots.load_snapshot_chunk(height, format, chunk))
    }

    pub fn apply_snapshot_chunk(
        &mut self,
        index: u32,
        chunk: &[u8],
        sender: &str,
    ) -> AppResult<ApplyChunkOutcome> {
        self.ensure_serving(CallKind::Lifecycle)?;
        Ok(self.snapshots.apply_snapshot_chunk(index, chunk, sender))
    }

    // ------------------------------------------------------------------
    // Fault handling
    // ------------------------------------------------------------------

    fn ensure_serving(&self, kind: CallKind) -> AppResult<()> {
        match &self.halted {
            Some(reason) if !self.policy.serves_when_halted(kind) => Err(AppError::Halted {
                reason: reason.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Records a fault and halts when the policy says so.
    fn fail(&mut self, kind: CallKind, err: AppError) -> AppError {
        if !self.policy.halts_on(kind) {
            self.report(&err);
            return err;
        }
        let err = err.into_halting();
        self.report(&err);
        self.halt(&err);
        err
    }

    fn report(&self, err: &AppError) {
        self.metrics.increment_internal_faults();
        let message = err.to_string();
        log_event_with_fields(
            Event::InternalFault,
            &[
                ("code", err.code()),
                ("severity", err.severity().as_str()),
                ("error", message.as_str()),
            ],
        );
    }

    fn halt(&mut self, err: &AppError) {
        if self.halted.is_some() {
            return;
        }
        self.block.discard();
        let reason = format!("{}: {}", err.code(), err);
        log_event_with_fields(
            Event::AppHalted,
            &[("policy", self.policy.as_str()), ("reason", reason.as_str())],
        );
        self.halted = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::storage::{
        CommitInfo, MemoryStore, ReadStore, StagingTxn, StorageError, StorageResult,
    };

    /// Memory engine whose reads and commits can be made to fail.
    #[derive(Default)]
    struct FaultyEngine {
        inner: MemoryStore,
        fail_reads: Arc<AtomicBool>,
        fail_commits: Arc<AtomicBool>,
    }

    impl ReadStore for FaultyEngine {
        fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::read_failed(
                    "injected read failure",
                    io::Error::new(io::ErrorKind::Other, "EIO"),
                ));
            }
            self.inner.get(key)
        }
    }

    impl KvEngine for FaultyEngine {
        fn version(&self) -> u64 {
            self.inner.version()
        }

        fn commit(&mut self, txn: StagingTxn) -> StorageResult<CommitInfo> {
            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(StorageError::write_failed(
                    "injected commit failure",
                    io::Error::new(io::ErrorKind::Other, "ENOSPC"),
                ));
            }
            self.inner.commit(txn)
        }

        fn iter_committed(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
            self.inner.iter_committed()
        }
    }

    fn faulty_app(policy: FatalPolicy) -> (KvStoreApplication, Arc<AtomicBool>, Arc<AtomicBool>) {
        let engine = FaultyEngine::default();
        let reads = Arc::clone(&engine.fail_reads);
        let commits = Arc::clone(&engine.fail_commits);
        (KvStoreApplication::new(Box::new(engine), policy), reads, commits)
    }

    fn memory_app() -> KvStoreApplication {
        KvStoreApplication::new(Box::new(MemoryStore::new()), FatalPolicy::Halt)
    }

    fn commit_block(app: &mut KvStoreApplication, height: i64, txs: &[&str]) -> Vec<TxCode> {
        app.begin_block(height).unwrap();
        let codes = txs
            .iter()
            .map(|tx| app.deliver_tx(tx.as_bytes()).unwrap())
            .collect();
        app.end_block(height).unwrap();
        app.commit().unwrap();
        codes
    }

    #[test]
    fn test_block_commit_makes_write_visible() {
        let mut app = memory_app();
        let codes = commit_block(&mut app, 1, &["k=v"]);
        assert_eq!(codes, vec![TxCode::Ok]);

        let result = app.query(b"k").unwrap();
        assert_eq!(result.value.as_deref(), Some(&b"v"[..]));
        assert_eq!(result.log(), "exists");
        assert_eq!(app.info().unwrap().last_block_height, 1);
    }

    #[test]
    fn test_open_block_invisible_to_reads() {
        let mut app = memory_app();
        app.begin_block(1).unwrap();
        assert_eq!(app.deliver_tx(b"k=v").unwrap(), TxCode::Ok);

        assert!(!app.query(b"k").unwrap().found());
        assert_eq!(app.query(b"k").unwrap().log(), "does not exist");
        assert_eq!(app.check_tx(b"k=v").unwrap().code, TxCode::Ok);
    }

    #[test]
    fn test_check_tx_reports_gas() {
        let mut app = memory_app().with_gas_wanted(7);
        let outcome = app.check_tx(b"a=b").unwrap();
        assert_eq!(outcome.gas_wanted, 7);
        assert_eq!(app.check_tx(b"ab").unwrap().code, TxCode::Malformed);
    }

    #[test]
    fn test_rejections_do_not_abort_block() {
        let mut app = memory_app();
        let codes = commit_block(&mut app, 1, &["bad", "a=1", "x=y=z"]);
        assert_eq!(codes, vec![TxCode::Malformed, TxCode::Ok, TxCode::Malformed]);
        assert!(app.query(b"a").unwrap().found());
    }

    #[test]
    fn test_last_write_wins_within_block() {
        let mut app = memory_app();
        commit_block(&mut app, 1, &["k=1", "k=2"]);
        assert_eq!(app.query(b"k").unwrap().value, Some(b"2".to_vec()));
    }

    #[test]
    fn test_intra_block_duplicates_both_accepted() {
        let mut app = memory_app();
        let codes = commit_block(&mut app, 1, &["a=1", "a=1"]);
        assert_eq!(codes, vec![TxCode::Ok, TxCode::Ok]);
        assert_eq!(app.query(b"a").unwrap().value, Some(b"1".to_vec()));
    }

    #[test]
    fn test_duplicate_across_blocks() {
        let mut app = memory_app();
        assert_eq!(commit_block(&mut app, 1, &["k=v"]), vec![TxCode::Ok]);
        assert_eq!(commit_block(&mut app, 2, &["k=v"]), vec![TxCode::Duplicate]);
        assert_eq!(app.check_tx(b"k=v").unwrap().code, TxCode::Duplicate);
        assert_eq!(app.check_tx(b"k=w").unwrap().code, TxCode::Ok);
    }

    #[test]
    fn test_double_begin_halts() {
        let mut app = memory_app();
        app.begin_block(1).unwrap();

        let err = app.begin_block(2).unwrap_err();
        assert!(matches!(err, AppError::BlockAlreadyOpen { .. }));
        assert!(app.is_halted());
        assert_eq!(app.phase(), BlockPhase::Idle);

        let err = app.query(b"k").unwrap_err();
        assert_eq!(err.code(), "KV_APP_HALTED");
    }

    #[test]
    fn test_deliver_without_block_halts() {
        let mut app = memory_app();
        let err = app.deliver_tx(b"k=v").unwrap_err();
        assert_eq!(err.code(), "KV_APP_NO_OPEN_BLOCK");
        assert!(err.is_fatal());
        assert!(app.is_halted());
    }

    #[test]
    fn test_commit_without_block_halts() {
        let mut app = memory_app();
        let err = app.commit().unwrap_err();
        assert_eq!(err.code(), "KV_APP_NO_OPEN_BLOCK");
        assert!(app.is_halted());
        assert_eq!(app.info().unwrap_err().code(), "KV_APP_HALTED");
    }

    #[test]
    fn test_end_block_without_block_is_acknowledged() {
        let mut app = memory_app();
        app.end_block(5).unwrap();
        assert!(!app.is_halted());
    }

    #[test]
    fn test_commit_failure_halts_under_halt_policy() {
        let (mut app, _reads, commits) = faulty_app(FatalPolicy::Halt);
        app.begin_block(1).unwrap();
        app.deliver_tx(b"k=v").unwrap();
        commits.store(true, Ordering::SeqCst);

        let err = app.commit().unwrap_err();
        assert_eq!(err.code(), "KV_STORAGE_WRITE_FAILED");
        assert!(err.is_fatal());
        assert!(app.is_halted());
        assert_eq!(app.query(b"k").unwrap_err().code(), "KV_APP_HALTED");
        assert_eq!(app.metrics().snapshot().internal_faults, 1);
    }

    #[test]
    fn test_commit_failure_keeps_reads_under_serve_reads() {
        let (mut app, _reads, commits) = faulty_app(FatalPolicy::ServeReads);
        commit_block(&mut app, 1, &["a=1"]);

        app.begin_block(2).unwrap();
        app.deliver_tx(b"b=2").unwrap();
        commits.store(true, Ordering::SeqCst);
        assert!(app.commit().unwrap_err().is_fatal());

        assert!(app.is_halted());
        assert_eq!(app.query(b"a").unwrap().value, Some(b"1".to_vec()));
        assert!(!app.query(b"b").unwrap().found());
        assert_eq!(app.check_tx(b"c=3").unwrap().code, TxCode::Ok);
        assert_eq!(app.info().unwrap().last_block_height, 1);

        let err = app.begin_block(3).unwrap_err();
        assert_eq!(err.code(), "KV_APP_HALTED");
    }

    #[test]
    fn test_read_fault_under_serve_reads_fails_one_request() {
        let (mut app, reads, _commits) = faulty_app(FatalPolicy::ServeReads);
        reads.store(true, Ordering::SeqCst);

        let err = app.check_tx(b"k=v").unwrap_err();
        assert_eq!(err.code(), "KV_STORAGE_READ_FAILED");
        assert!(!err.is_fatal());
        assert!(app.query(b"k").is_err());
        assert!(!app.is_halted());

        reads.store(false, Ordering::SeqCst);
        assert_eq!(app.check_tx(b"k=v").unwrap().code, TxCode::Ok);
        commit_block(&mut app, 1, &["k=v"]);
    }

    #[test]
    fn test_read_fault_under_halt_policy_halts() {
        let (mut app, reads, _commits) = faulty_app(FatalPolicy::Halt);
        reads.store(true, Ordering::SeqCst);
        app.query(b"k").unwrap_err();
        assert!(app.is_halted());

        reads.store(false, Ordering::SeqCst);
        assert_eq!(app.query(b"k").unwrap_err().code(), "KV_APP_HALTED");
    }

    #[test]
    fn test_deliver_read_fault_halts_even_under_serve_reads() {
        let (mut app, reads, _commits) = faulty_app(FatalPolicy::ServeReads);
        app.begin_block(1).unwrap();
        reads.store(true, Ordering::SeqCst);

        let err = app.deliver_tx(b"k=v").unwrap_err();
        assert_eq!(err.code(), "KV_STORAGE_READ_FAILED");
        assert!(app.is_halted());
        assert_eq!(app.phase(), BlockPhase::Idle);
    }

    #[test]
    fn test_set_option_and_snapshots() {
        let mut app = memory_app();
        let outcome = app.set_option("anything", "value").unwrap();
        assert_eq!(outcome.code, 0);
        assert_eq!(outcome.log, "No options are supported yet");

        assert!(app.list_snapshots().unwrap().is_empty());
        assert_eq!(
            app.offer_snapshot(&Snapshot::default(), b"").unwrap(),
            OfferSnapshotResult::Unknown
        );
        assert!(app.load_snapshot_chunk(1, 0, 0).unwrap().is_empty());
        assert_eq!(
            app.apply_snapshot_chunk(0, b"", "peer").unwrap(),
            ApplyChunkOutcome::default()
        );
    }
}
