//! kvstore - a key=value state machine driven by a consensus engine
//!
//! Transactions are raw `key=value` bytes. The consensus engine feeds them
//! through CheckTx (mempool admission) and, per block, BeginBlock /
//! DeliverTx / Commit; committed pairs are readable through Query.

pub mod api;
pub mod app;
pub mod cli;
pub mod observability;
pub mod storage;
pub mod validation;
