//! Log reader with strict corruption detection
//!
//! Used when a `LogStore` opens to replay every committed batch. Any
//! checksum failure aborts the open. A record cut short by end of file is
//! surfaced separately so the caller can decide whether it is a torn write.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{LogRecord, MIN_RECORD_SIZE};

/// One step of a sequential read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    Record(LogRecord),
    End,
    /// The record at `offset` runs past end of file
    TornTail { offset: u64, reason: String },
}

/// Sequential reader over the store log.
pub struct LogReader {
    /// Buffered reader
    reader: BufReader<File>,
    /// Current byte offset
    current_offset: u64,
    /// Total file size
    file_size: u64,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open store log: {}", log_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(KV_DATA_CORRUPTION)` on checksum failure or truncation
    pub fn read_next(&mut self) -> StorageResult<Option<LogRecord>> {
        match self.read_step()? {
            ReadStep::Record(record) => Ok(Some(record)),
            ReadStep::End => Ok(None),
            ReadStep::TornTail { offset, reason } => {
                Err(StorageError::corruption_at_offset(offset, reason))
            }
        }
    }

    /// Reads the next record, reporting a record cut short by end of file
    /// as `TornTail` instead of failing.
    ///
    /// A checksum mismatch or an impossible length is still an error.
    pub fn read_step(&mut self) -> StorageResult<ReadStep> {
        if self.current_offset >= self.file_size {
            return Ok(ReadStep::End);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Ok(ReadStep::TornTail {
                offset: self.current_offset,
                reason: format!(
                    "Truncated log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            });
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Ok(ReadStep::TornTail {
                offset: self.current_offset,
                reason: format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            });
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, bytes_consumed) = LogRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += bytes_consumed as u64;

        Ok(ReadStep::Record(record))
    }

    /// Reads all records. Any corruption causes immediate failure.
    pub fn read_all(&mut self) -> StorageResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_records(path: &Path, records: &[LogRecord]) {
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend_from_slice(&record.serialize());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_reads_records_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kvstore.log");
        let records = vec![
            LogRecord::put(b"a".to_vec(), b"1".to_vec()),
            LogRecord::put(b"b".to_vec(), b"2".to_vec()),
            LogRecord::commit(1),
        ];
        write_records(&path, &records);

        let mut reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.read_all().unwrap(), records);
        assert_eq!(reader.current_offset(), fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_empty_log_reads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kvstore.log");
        fs::write(&path, b"").unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_truncated_tail_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kvstore.log");
        write_records(&path, &[LogRecord::put(b"a".to_vec(), b"1".to_vec()), LogRecord::commit(1)]);

        let contents = fs::read(&path).unwrap();
        fs::write(&path, &contents[..contents.len() - 3]).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let err = reader.read_next().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.details().unwrap().starts_with("byte_offset:"));
    }

    #[test]
    fn test_read_step_reports_torn_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kvstore.log");
        write_records(&path, &[LogRecord::put(b"a".to_vec(), b"1".to_vec()), LogRecord::commit(1)]);

        let first_len = LogRecord::put(b"a".to_vec(), b"1".to_vec()).serialize().len() as u64;
        let contents = fs::read(&path).unwrap();
        fs::write(&path, &contents[..contents.len() - 3]).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(matches!(reader.read_step().unwrap(), ReadStep::Record(_)));
        match reader.read_step().unwrap() {
            ReadStep::TornTail { offset, .. } => assert_eq!(offset, first_len),
            other => panic!("expected torn tail, got {:?}", other),
        }
    }

    #[test]
    fn test_read_step_checksum_mismatch_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kvstore.log");
        write_records(&path, &[LogRecord::commit(1)]);

        let mut contents = fs::read(&path).unwrap();
        contents[6] ^= 0xFF;
        fs::write(&path, contents).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_step().unwrap_err().is_fatal());
    }
}
