//! Configuration structures for the tickday pipeline.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for one venue's preprocessing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input source configuration.
    pub source: SourceConfig,
    /// Trading-session configuration.
    pub session: SessionConfig,
    /// Chunked reading configuration.
    pub reader: ReaderConfig,
    /// Trade stream configuration.
    pub trades: TradeConfig,
    /// Quote stream configuration.
    pub quotes: QuoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            session: SessionConfig::default(),
            reader: ReaderConfig::default(),
            trades: TradeConfig::default(),
            quotes: QuoteConfig::default(),
        }
    }
}

/// Where the raw files live and how to select them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Folder containing the raw per-instrument files.
    pub input_folder: PathBuf,
    /// Substring marking the venue/data source (e.g. ".BS_" for BATS);
    /// empty selects every file with the configured suffix.
    pub venue_filter: String,
    /// File suffix of raw inputs.
    pub file_suffix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("."),
            venue_filter: String::new(),
            file_suffix: ".csv.gz".to_string(),
        }
    }
}

/// Official trading-session window in local venue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session open (inclusive).
    pub start: NaiveTime,
    /// Session close (inclusive).
    pub end: NaiveTime,
    /// Fixed shift in hours applied on top of each record's GMT offset to
    /// reach local venue time (primary venues 0, MTFs typically 1).
    pub local_time_shift_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            local_time_shift_hours: 0,
        }
    }
}

/// Chunked reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Rows per physical read. Trades memory for fewer index lookups.
    pub chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000_000,
        }
    }
}

/// Trade stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfig {
    /// Prefix of the qualifier string marking a valid executed trade.
    pub active_flag_marker: String,
    /// Interval length for the optional intraday event-count distribution;
    /// `None` disables it.
    pub distribution_interval_secs: Option<u32>,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            active_flag_marker: " [ACT_FLAG1]".to_string(),
            distribution_interval_secs: None,
        }
    }
}

/// Quote stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Drop quotes without four positive bid/ask fields (after the
    /// within-day forward fill). Removes the market-open prologue.
    pub trim_prologue: bool,
    /// Grid interval in seconds for the realized-volatility estimator.
    pub grid_interval_secs: u32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            trim_prologue: true,
            grid_interval_secs: 10,
        }
    }
}
