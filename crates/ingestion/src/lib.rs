//! Data ingestion for the tickday pipeline.
//!
//! This crate handles:
//! - Raw-file discovery and instrument-id extraction
//! - Tick-record decoding (headerless gzip CSV)
//! - The per-date row index (build, persist, load)
//! - Chunked day-aligned reading

pub mod day_reader;
pub mod discovery;
pub mod reader;
pub mod row_index;

pub use day_reader::ChunkedDayReader;
pub use reader::{open_raw, TickReader};
pub use row_index::{build_date_index, DateIndex, RowIndex};
