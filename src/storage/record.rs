//! Log record types
//!
//! Record format:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Kind             | (u8: 1 = put, 2 = commit)
//! +------------------+
//! | Body             | put:    key (u32 LE len + bytes), value (u32 LE len + bytes)
//! |                  | commit: version (u64 LE)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself. A batch is a run of
//! put records closed by exactly one commit record.

use std::io::{self, Read};

const KIND_PUT: u8 = 1;
const KIND_COMMIT: u8 = 2;

/// Smallest well-formed record: length + kind + 8 body bytes + checksum.
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 1 + 8 + 4;

/// A single record in the append-only store log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A staged write belonging to the batch being committed
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Closes a batch; the batch becomes visible at `version`
    Commit { version: u64 },
}

impl LogRecord {
    /// Create a put record
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        LogRecord::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a commit marker
    pub fn commit(version: u64) -> Self {
        LogRecord::Commit { version }
    }

    fn kind(&self) -> u8 {
        match self {
            LogRecord::Put { .. } => KIND_PUT,
            LogRecord::Commit { .. } => KIND_COMMIT,
        }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            LogRecord::Put { key, value } => {
                buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
                buf.extend_from_slice(key);
                buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
                buf.extend_from_slice(value);
            }
            LogRecord::Commit { version } => {
                buf.extend_from_slice(&version.to_le_bytes());
            }
        }
        buf
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + 1 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.push(self.kind());
        record.extend_from_slice(&body);

        let checksum = super::checksum::compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = super::checksum::compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let body = &data[5..checksum_offset];
        let record = match data[4] {
            KIND_PUT => {
                let mut cursor = io::Cursor::new(body);
                let key = read_bytes(&mut cursor)?;
                let value = read_bytes(&mut cursor)?;
                if cursor.position() as usize != body.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "Trailing bytes in put record",
                    ));
                }
                LogRecord::Put { key, value }
            }
            KIND_COMMIT => {
                let bytes: [u8; 8] = body.try_into().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Commit record body must be 8 bytes, got {}", body.len()),
                    )
                })?;
                LogRecord::Commit {
                    version: u64::from_le_bytes(bytes),
                }
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unknown record kind: {}", other),
                ))
            }
        };

        Ok((record, record_length))
    }
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    Ok(buf)
}
