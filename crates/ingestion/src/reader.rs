//! Raw tick-record decoding.
//!
//! Input files are headerless delimited text with a fixed thirteen-column
//! layout, usually gzip-compressed. Structural fields (date, time, GMT
//! offset) must parse; measure fields coerce to `None` on failure.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use flate2::read::GzDecoder;
use tickday_core::{Error, RecordType, Result, TickRecord};

/// Columns per raw record: ric, date, time, GMT offset, type, contributor,
/// price, volume, bid price, bid size, ask price, ask size, qualifiers.
const FIELD_COUNT: usize = 13;

/// Open a raw instrument file, transparently decoding gzip by extension.
pub fn open_raw(path: &Path) -> Result<TickReader<Box<dyn Read>>> {
    let file = File::open(path)?;
    let input: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(TickReader::new(input))
}

/// Sequential decoder over one instrument's raw records.
///
/// Tracks the absolute row number so callers can relate decoded records to
/// row-index offsets.
pub struct TickReader<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    row: u64,
}

impl<R: Read> TickReader<R> {
    /// Create a reader over decompressed raw input.
    pub fn new(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        Self {
            reader,
            record: csv::StringRecord::new(),
            row: 0,
        }
    }

    /// Absolute row number of the next record to be read.
    pub fn position(&self) -> u64 {
        self.row
    }

    /// Read up to `limit` records. A result shorter than `limit` means the
    /// file is exhausted.
    pub fn read_chunk(&mut self, limit: usize) -> Result<Vec<TickRecord>> {
        let mut out = Vec::with_capacity(limit.min(65_536));
        while out.len() < limit {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            out.push(parse_record(&self.record, self.row)?);
            self.row += 1;
        }
        Ok(out)
    }
}

fn parse_record(rec: &csv::StringRecord, row: u64) -> Result<TickRecord> {
    if rec.len() != FIELD_COUNT {
        return Err(Error::decode(format!(
            "row {row}: expected {FIELD_COUNT} fields, got {}",
            rec.len()
        )));
    }

    let date = parse_date(&rec[1])
        .ok_or_else(|| Error::decode(format!("row {row}: invalid date {:?}", &rec[1])))?;
    let time = NaiveTime::parse_from_str(&rec[2], "%H:%M:%S%.f")
        .map_err(|e| Error::decode(format!("row {row}: invalid time {:?}: {e}", &rec[2])))?;
    let gmt_offset = rec[3]
        .trim()
        .parse::<i32>()
        .map_err(|e| Error::decode(format!("row {row}: invalid GMT offset {:?}: {e}", &rec[3])))?;

    Ok(TickRecord {
        ric: rec[0].to_string(),
        date,
        time,
        gmt_offset,
        record_type: RecordType::from_field(&rec[4]),
        contributor: rec[5].to_string(),
        price: parse_opt_f64(&rec[6]),
        volume: parse_opt_f64(&rec[7]),
        bid_price: parse_opt_f64(&rec[8]),
        bid_size: parse_opt_f64(&rec[9]),
        ask_price: parse_opt_f64(&rec[10]),
        ask_size: parse_opt_f64(&rec[11]),
        qualifiers: rec[12].to_string(),
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%b-%Y"))
        .ok()
}

/// Lenient numeric coercion: empty or unparsable becomes `None`.
pub fn parse_opt_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        s.parse::<f64>().ok()
    }
}
