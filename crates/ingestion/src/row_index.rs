//! Date row index: the first row number of each calendar date in a raw
//! file, built once by a sequential scan and persisted as JSON.
//!
//! The chunked day reader relies on these offsets to split batches at
//! exact day boundaries without re-scanning.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tickday_core::{Error, Result};
use tracing::info;

use crate::reader::TickReader;

/// Rows per sub-chunk during an index scan. Deliberately small and
/// independent of the aggregation chunk size; the scan holds only one
/// sub-chunk in memory at a time.
const SCAN_CHUNK_ROWS: usize = 5_000;

/// Mapping date -> absolute first row number, for one instrument file.
pub type DateIndex = BTreeMap<NaiveDate, u64>;

/// Build the date index for one raw file by a single sequential scan.
///
/// A date is recorded only when a transition into it is observed, so a
/// truncated file can never index a date at a row where it does not begin.
/// A date seen twice means the file is not date-sorted and is rejected.
pub fn build_date_index<R: Read>(reader: &mut TickReader<R>) -> Result<DateIndex> {
    let mut index = DateIndex::new();
    let mut last_date: Option<NaiveDate> = None;
    loop {
        let base = reader.position();
        let chunk = reader.read_chunk(SCAN_CHUNK_ROWS)?;
        if chunk.is_empty() {
            break;
        }
        for (i, rec) in chunk.iter().enumerate() {
            if last_date != Some(rec.date) {
                if index.contains_key(&rec.date) {
                    return Err(Error::data(format!(
                        "date {} occurs twice at row {}; file is not date-sorted",
                        rec.date,
                        base + i as u64
                    )));
                }
                index.insert(rec.date, base + i as u64);
                last_date = Some(rec.date);
            }
        }
        if chunk.len() < SCAN_CHUNK_ROWS {
            break;
        }
    }
    info!(days = index.len(), rows = reader.position(), "built date index");
    Ok(index)
}

/// Venue-level row index: instrument -> date -> first row number.
///
/// Persisted as a plain nested JSON mapping, one file per venue. Loading
/// never falls back to re-indexing; a missing or corrupt file is an error
/// and rebuilding is an explicit, separate operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIndex {
    instruments: BTreeMap<String, DateIndex>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the date index of one instrument.
    pub fn insert(&mut self, ric: impl Into<String>, index: DateIndex) {
        self.instruments.insert(ric.into(), index);
    }

    /// Date index of one instrument, if present.
    pub fn get(&self, ric: &str) -> Option<&DateIndex> {
        self.instruments.get(ric)
    }

    /// Number of indexed instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Iterate over (instrument, date index) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DateIndex)> {
        self.instruments.iter()
    }

    /// Serialize the index to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| Error::index(format!("cannot write {}: {e}", path.display())))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a previously saved index.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::index(format!("cannot open {}: {e}", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::index(format!("corrupt index file {}: {e}", path.display())))
    }
}
