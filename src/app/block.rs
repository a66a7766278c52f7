//! Block lifecycle state
//!
//! ```text
//! Idle --begin--> Open --deliver*--> Open --take (commit)--> Idle
//! ```
//!
//! At most one staging transaction exists. Opening a second one, or
//! delivering / committing without one, is a protocol violation reported
//! as a fatal `AppError`.

use crate::storage::StagingTxn;

use super::errors::{AppError, AppResult};

/// The block currently being built.
#[derive(Debug)]
pub struct OpenBlock {
    /// Height from the BeginBlock header; informational only
    pub height: i64,
    /// Writes accepted so far, in delivery order, last write wins
    pub txn: StagingTxn,
    /// DeliverTx calls answered with code 0
    pub accepted: usize,
    /// DeliverTx calls answered with a rejection code
    pub rejected: usize,
}

/// Phase of the block lifecycle, for introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    Idle,
    Open,
}

/// Explicit holder of the single staging transaction.
#[derive(Debug, Default)]
pub struct BlockState {
    open: Option<OpenBlock>,
}

impl BlockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BlockPhase {
        match self.open {
            Some(_) => BlockPhase::Open,
            None => BlockPhase::Idle,
        }
    }

    /// Fails if a block is already open.
    pub fn ensure_idle(&self, height: i64) -> AppResult<()> {
        match &self.open {
            Some(open) => Err(AppError::BlockAlreadyOpen {
                height,
                open_height: open.height,
            }),
            None => Ok(()),
        }
    }

    /// Idle → Open.
    pub fn begin(&mut self, height: i64, txn: StagingTxn) -> AppResult<()> {
        self.ensure_idle(height)?;
        self.open = Some(OpenBlock {
            height,
            txn,
            accepted: 0,
            rejected: 0,
        });
        Ok(())
    }

    /// The open block, or `NoOpenBlock` naming `call`.
    pub fn open_mut(&mut self, call: &'static str) -> AppResult<&mut OpenBlock> {
        self.open.as_mut().ok_or(AppError::NoOpenBlock { call })
    }

    /// The open block, or `NoOpenBlock` naming `call`.
    pub fn open_ref(&self, call: &'static str) -> AppResult<&OpenBlock> {
        self.open.as_ref().ok_or(AppError::NoOpenBlock { call })
    }

    /// Open → Idle, handing the block to the committer.
    pub fn take(&mut self, call: &'static str) -> AppResult<OpenBlock> {
        self.open.take().ok_or(AppError::NoOpenBlock { call })
    }

    /// Drops any open block without committing it.
    pub fn discard(&mut self) -> Option<OpenBlock> {
        self.open.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_take_cycle() {
        let mut state = BlockState::new();
        assert_eq!(state.phase(), BlockPhase::Idle);

        state.begin(1, StagingTxn::new(0)).unwrap();
        assert_eq!(state.phase(), BlockPhase::Open);

        let block = state.take("commit").unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(state.phase(), BlockPhase::Idle);
    }

    #[test]
    fn test_second_begin_rejected() {
        let mut state = BlockState::new();
        state.begin(1, StagingTxn::new(0)).unwrap();

        let err = state.begin(2, StagingTxn::new(0)).unwrap_err();
        assert!(matches!(err, AppError::BlockAlreadyOpen { height: 2, open_height: 1 }));
        assert_eq!(state.open_ref("deliver_tx").unwrap().height, 1);
    }

    #[test]
    fn test_take_without_block() {
        let mut state = BlockState::new();
        let err = state.take("commit").unwrap_err();
        assert_eq!(err.code(), "KV_APP_NO_OPEN_BLOCK");
    }
}
