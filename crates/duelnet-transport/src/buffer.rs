//! Record accumulation for the background read task.
//!
//! TCP delivers bytes, not records: one read may hold half a record, or
//! three and a bit. [`RecordBuffer`] keeps the partial tail between reads
//! and hands back every record that the latest chunk completed.

use tracing::warn;

/// Upper bound on a single record. A peer that streams this many bytes
/// without a delimiter is sending garbage; the oversized record is dropped
/// like any other malformed one.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Splits an incoming byte stream into delimiter-terminated records.
#[derive(Debug)]
pub struct RecordBuffer {
    delimiter: u8,
    max_len: usize,
    pending: Vec<u8>,
    /// Set after an overflow until the next delimiter, so the remainder of
    /// the oversized record is not mistaken for a fresh one.
    discarding: bool,
}

impl RecordBuffer {
    /// A buffer splitting on `delimiter` with the default size limit.
    pub fn new(delimiter: u8) -> Self {
        Self::with_limit(delimiter, MAX_RECORD_LEN)
    }

    /// A buffer splitting on `delimiter`, dropping records over `max_len`.
    pub fn with_limit(delimiter: u8, max_len: usize) -> Self {
        Self {
            delimiter,
            max_len,
            pending: Vec::new(),
            discarding: false,
        }
    }

    /// Appends a chunk and returns the records it completed, in order.
    ///
    /// Returned records never include the delimiter. Empty records (two
    /// delimiters in a row) are skipped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut records = Vec::new();

        for piece in bytes.split_inclusive(|b| *b == self.delimiter) {
            let complete = piece.last() == Some(&self.delimiter);
            let body = if complete {
                &piece[..piece.len() - 1]
            } else {
                piece
            };

            if self.discarding {
                if complete {
                    self.discarding = false;
                }
                continue;
            }

            self.pending.extend_from_slice(body);
            if self.pending.len() > self.max_len {
                warn!(
                    len = self.pending.len(),
                    max = self.max_len,
                    "dropping oversized record"
                );
                self.pending.clear();
                self.discarding = !complete;
                continue;
            }

            if complete {
                let record = std::mem::take(&mut self.pending);
                if !record.is_empty() {
                    records.push(record);
                }
            }
        }

        records
    }

    /// Bytes held for a record that has not been terminated yet.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
