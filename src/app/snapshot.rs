//! State-sync snapshot capability
//!
//! The application does not produce or restore snapshots. The capability
//! is kept behind `SnapshotProvider` so an implementation can be plugged in
//! without touching the dispatcher; `UnsupportedSnapshots` is the default.

use serde::{Deserialize, Serialize};

/// Snapshot metadata as exchanged with the consensus engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub height: u64,
    pub format: u32,
    pub chunks: u32,
    #[serde(with = "crate::api::base64_bytes")]
    pub hash: Vec<u8>,
    #[serde(with = "crate::api::base64_bytes")]
    pub metadata: Vec<u8>,
}

/// Answer to an offered snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSnapshotResult {
    #[default]
    Unknown,
    Accept,
    Abort,
    Reject,
    RejectFormat,
    RejectSender,
}

/// Answer to an applied chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyChunkResult {
    #[default]
    Unknown,
    Accept,
    Abort,
    Retry,
    RetrySnapshot,
    RejectSnapshot,
}

/// Outcome of applying one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyChunkOutcome {
    pub result: ApplyChunkResult,
    pub refetch_chunks: Vec<u32>,
    pub reject_senders: Vec<String>,
}

/// Snapshot protocol as seen from the application
pub trait SnapshotProvider {
    /// Snapshots this node can serve
    fn list_snapshots(&self) -> Vec<Snapshot>;

    /// Decide whether to restore from `snapshot`
    fn offer_snapshot(&mut self, snapshot: &Snapshot, app_hash: &[u8]) -> OfferSnapshotResult;

    /// Bytes of one chunk of a local snapshot
    fn load_snapshot_chunk(&self, height: u64, format: u32, chunk: u32) -> Vec<u8>;

    /// Apply one chunk of the snapshot being restored
    fn apply_snapshot_chunk(&mut self, index: u32, chunk: &[u8], sender: &str) -> ApplyChunkOutcome;
}

/// State sync is not supported: nothing to list, nothing accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSnapshots;

impl SnapshotProvider for UnsupportedSnapshots {
    fn list_snapshots(&self) -> Vec<Snapshot> {
        Vec::new()
    }

    fn offer_snapshot(&mut self, _snapshot: &Snapshot, _app_hash: &[u8]) -> OfferSnapshotResult {
        OfferSnapshotResult::Unknown
    }

    fn load_snapshot_chunk(&self, _height: u64, _format: u32, _chunk: u32) -> Vec<u8> {
        Vec::new()
    }

    fn apply_snapshot_chunk(&mut self, _index: u32, _chunk: &[u8], _sender: &str) -> ApplyChunkOutcome {
        ApplyChunkOutcome::default()
    }
}
