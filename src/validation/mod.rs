//! Transaction validation
//!
//! A transaction is the raw byte string `key=value` with exactly one `=`.
//! Validation is a pure function of the transaction and the committed
//! store. It runs twice for every included transaction: once at CheckTx and
//! again at DeliverTx, because the committed store may have moved between
//! the two.
//!
//! Only the committed store is consulted. Writes staged by the open block
//! are invisible here, so two identical `key=value` in one block are both
//! accepted.

mod code;
mod tx;

pub use code::TxCode;
pub use tx::{KvTx, DELIMITER};

use crate::storage::{ReadStore, StorageResult};

/// Validates `tx` against the committed `store`.
///
/// - no `=` or more than one `=` → `TxCode::Malformed`
/// - `store` already maps `key` to the identical `value` → `TxCode::Duplicate`
/// - otherwise → `TxCode::Ok`
///
/// # Errors
///
/// A failed store read is returned unchanged. The caller must abort the
/// request; a read failure never turns into an accept or reject code.
pub fn validate<S: ReadStore + ?Sized>(tx: &[u8], store: &S) -> StorageResult<TxCode> {
    let parsed = match KvTx::parse(tx) {
        Some(parsed) => parsed,
        None => return Ok(TxCode::Malformed),
    };

    match store.get(parsed.key)? {
        Some(existing) if existing.as_slice() == parsed.value => Ok(TxCode::Duplicate),
        _ => Ok(TxCode::Ok),
    }
}
