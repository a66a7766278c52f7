//! `key=value` transaction decoding

/// Separator between key and value.
pub const DELIMITER: u8 = b'=';

/// A decoded `key=value` transaction borrowing from the raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvTx<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> KvTx<'a> {
    /// Splits `tx` on `=`.
    ///
    /// Returns `None` unless the split yields exactly two parts. Either part
    /// may be empty: `=v` and `k=` decode. No escaping exists, so any extra
    /// `=` makes the transaction undecodable.
    pub fn parse(tx: &'a [u8]) -> Option<Self> {
        let mut parts = tx.split(|b| *b == DELIMITER);
        let key = parts.next()?;
        let value = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { key, value })
    }
}
