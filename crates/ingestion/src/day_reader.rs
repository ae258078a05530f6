//! Chunked day-aligned reading.
//!
//! Reads a raw file in fixed-size record chunks and reassembles
//! date-aligned batches across chunk boundaries: the suffix of records
//! belonging to the last, not-yet-complete date (the tail) is held back
//! and prepended to the next chunk before re-splitting. Every yielded
//! batch except the final one therefore contains only whole days.

use std::io::Read;

use tickday_core::{Error, Result, TickRecord};
use tracing::debug;

use crate::reader::TickReader;
use crate::row_index::DateIndex;

/// Iterator of day-clean record batches over one instrument file.
///
/// Lazy, finite, and non-restartable. Split offsets come from the date
/// row index; an index that disagrees with the records actually seen at a
/// split boundary aborts iteration with a consistency error.
pub struct ChunkedDayReader<'a, R: Read> {
    reader: TickReader<R>,
    index: &'a DateIndex,
    chunk_size: usize,
    /// Absolute row number of the first record held in `tail`.
    base: u64,
    tail: Vec<TickRecord>,
    finished: bool,
}

impl<'a, R: Read> ChunkedDayReader<'a, R> {
    /// Create a reader over decompressed raw input with the instrument's
    /// date index.
    pub fn new(reader: TickReader<R>, index: &'a DateIndex, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be positive"));
        }
        Ok(Self {
            reader,
            index,
            chunk_size,
            base: 0,
            tail: Vec::new(),
            finished: false,
        })
    }

    fn next_batch(&mut self) -> Result<Option<Vec<TickRecord>>> {
        if self.finished {
            return Ok(None);
        }

        let chunk = self.reader.read_chunk(self.chunk_size)?;
        let eof = chunk.len() < self.chunk_size;

        let mut combined = std::mem::take(&mut self.tail);
        combined.extend(chunk);

        if eof {
            // No further date can arrive, so the trailing day is complete.
            self.finished = true;
            if combined.is_empty() {
                return Ok(None);
            }
            debug!(rows = combined.len(), "yielding final batch");
            return Ok(Some(combined));
        }

        let split = self.split_offset(&combined)?;
        let new_tail = combined.split_off(split);
        self.base += combined.len() as u64;
        self.tail = new_tail;
        debug!(
            head = combined.len(),
            tail = self.tail.len(),
            "split chunk at day boundary"
        );
        Ok(Some(combined))
    }

    /// Local offset in `combined` where its last date begins.
    ///
    /// The index supplies the date's absolute first row; the records at
    /// the boundary are checked against it so a stale or rebuilt index
    /// fails loudly instead of mis-splitting.
    fn split_offset(&self, combined: &[TickRecord]) -> Result<usize> {
        let last_date = combined[combined.len() - 1].date;
        let first_row = *self.index.get(&last_date).ok_or_else(|| {
            Error::consistency(format!(
                "date {last_date} missing from row index; rebuild the index"
            ))
        })?;

        if first_row < self.base || first_row - self.base >= combined.len() as u64 {
            return Err(Error::consistency(format!(
                "index places date {last_date} at row {first_row}, outside rows {}..{}",
                self.base,
                self.base + combined.len() as u64
            )));
        }
        let local = (first_row - self.base) as usize;

        if combined[local].date != last_date
            || (local > 0 && combined[local - 1].date == last_date)
        {
            return Err(Error::consistency(format!(
                "index offset {first_row} is not the first row of date {last_date}"
            )));
        }
        Ok(local)
    }
}

impl<'a, R: Read> Iterator for ChunkedDayReader<'a, R> {
    type Item = Result<Vec<TickRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
