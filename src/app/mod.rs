//! Block application layer
//!
//! Drives the committed store through the consensus lifecycle:
//! BeginBlock opens a staging transaction, DeliverTx validates and stages,
//! Commit makes the block durable as one unit. CheckTx and Query read the
//! committed store only.
//!
//! Internal faults are typed `AppError`s; `FatalPolicy` decides whether the
//! application keeps answering reads after one.

mod application;
mod block;
mod errors;
mod outcome;
mod policy;
mod snapshot;

pub use application::{BoxedEngine, KvStoreApplication, DEFAULT_GAS_WANTED};
pub use block::{BlockPhase, BlockState, OpenBlock};
pub use errors::{AppError, AppResult};
pub use outcome::{
    AppInfo, CheckTxOutcome, CommitOutcome, QueryOutcome, SetOptionOutcome, QUERY_LOG_EXISTS,
    QUERY_LOG_MISSING, SET_OPTION_LOG,
};
pub use policy::{CallKind, FatalPolicy};
pub use snapshot::{
    ApplyChunkOutcome, ApplyChunkResult, OfferSnapshotResult, Snapshot, SnapshotProvider,
    UnsupportedSnapshots,
};
