//! Venue processing pipeline.
//!
//! One venue's run as an explicit context object owned by the caller:
//! file discovery, the row-index lifecycle (build/save/load are separate,
//! explicit operations), the chunked per-instrument streaming pass,
//! result accumulation, and output. Nothing here is process-wide state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tickday_aggregation::{
    aggregate_trades, distribution, event_distribution, EventHistogram, QuoteAggregator,
    SessionFilter,
};
use tickday_core::{Config, Error, QuoteDaily, TradeDaily};
use tickday_ingestion::{build_date_index, discovery, open_raw, ChunkedDayReader, RowIndex};
use tracing::info;

use crate::output;

/// One venue's preprocessing run.
pub struct VenuePipeline {
    config: Config,
    files: Vec<PathBuf>,
    index: RowIndex,
    trade_rows: Vec<TradeDaily>,
    quote_rows: Vec<QuoteDaily>,
    distribution: EventHistogram,
    cancel: Arc<AtomicBool>,
}

impl VenuePipeline {
    /// Create a pipeline and discover the venue's raw files.
    pub fn new(config: Config) -> Result<Self> {
        let files = discovery::discover_files(
            &config.source.input_folder,
            &config.source.file_suffix,
            &config.source.venue_filter,
        )
        .with_context(|| {
            format!(
                "discovering raw files in {}",
                config.source.input_folder.display()
            )
        })?;
        info!(count = files.len(), "discovered instrument files");
        Ok(Self {
            config,
            files,
            index: RowIndex::new(),
            trade_rows: Vec::new(),
            quote_rows: Vec::new(),
            distribution: EventHistogram::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Venue label derived from the input folder and filter; names the
    /// index and output files.
    pub fn venue_label(&self) -> String {
        let folder = self
            .config
            .source
            .input_folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "venue".to_string());
        let filter = self.config.source.venue_filter.replace(['_', '.'], "");
        if filter.is_empty() {
            folder
        } else {
            format!("{folder} {filter}")
        }
    }

    /// Discovered raw files.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Accumulated per-day trade rows.
    pub fn trade_rows(&self) -> &[TradeDaily] {
        &self.trade_rows
    }

    /// Accumulated per-day quote rows.
    pub fn quote_rows(&self) -> &[QuoteDaily] {
        &self.quote_rows
    }

    /// Accumulated event-count distribution (empty unless enabled).
    pub fn distribution(&self) -> &EventHistogram {
        &self.distribution
    }

    /// Cancellation flag, checked between chunks.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Default index file location for this venue.
    pub fn index_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.venue_label()))
    }

    /// Scan every raw file and build the venue row index.
    ///
    /// Expensive and explicit: `process_all` never rebuilds an index
    /// implicitly, it fails instead.
    pub fn build_index(&mut self) -> Result<()> {
        let mut index = RowIndex::new();
        for (i, path) in self.files.iter().enumerate() {
            info!(
                file = %path.display(),
                "indexing file {} of {}",
                i + 1,
                self.files.len()
            );
            let ric = discovery::instrument_from_path(path)?;
            let mut reader =
                open_raw(path).with_context(|| format!("opening {}", path.display()))?;
            let dates = build_date_index(&mut reader)
                .with_context(|| format!("indexing {}", path.display()))?;
            index.insert(ric, dates);
        }
        self.index = index;
        Ok(())
    }

    /// Persist the venue row index as JSON.
    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.index.save(path)?;
        info!(path = %path.display(), "saved row index");
        Ok(())
    }

    /// Load a previously saved venue row index.
    pub fn load_index(&mut self, path: &Path) -> Result<()> {
        self.index = RowIndex::load(path)?;
        info!(path = %path.display(), instruments = self.index.len(), "loaded row index");
        Ok(())
    }

    /// Process every discovered instrument file against the loaded index,
    /// appending to the accumulated result tables.
    pub fn process_all(&mut self) -> Result<()> {
        if self.index.is_empty() {
            return Err(Error::index("row index is empty; build or load it first").into());
        }
        let session = SessionFilter::new(&self.config);
        let quote_agg = QuoteAggregator::new(&self.config);

        let files = self.files.clone();
        for (i, path) in files.iter().enumerate() {
            info!(
                file = %path.display(),
                "processing file {} of {}",
                i + 1,
                files.len()
            );
            self.process_file(path, &session, &quote_agg)
                .with_context(|| format!("processing {}", path.display()))?;
        }
        Ok(())
    }

    fn process_file(
        &mut self,
        path: &Path,
        session: &SessionFilter,
        quote_agg: &QuoteAggregator,
    ) -> Result<()> {
        let ric = discovery::instrument_from_path(path)?;
        let dates = self
            .index
            .get(&ric)
            .cloned()
            .ok_or_else(|| Error::consistency(format!("instrument {ric} missing from row index")))?;

        let reader = open_raw(path)?;
        let day_reader = ChunkedDayReader::new(reader, &dates, self.config.reader.chunk_size)?;

        let mut batches = 0u64;
        for batch in day_reader {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled.into());
            }
            let batch = batch?;
            batches += 1;
            if batch.is_empty() {
                continue;
            }

            let (trades, quotes) = session.split(&batch);
            if let Some(secs) = self.config.trades.distribution_interval_secs {
                distribution::merge(&mut self.distribution, &event_distribution(&trades, secs));
            }
            self.trade_rows.extend(aggregate_trades(&ric, &trades));
            self.quote_rows.extend(quote_agg.aggregate(&ric, &quotes));
        }
        info!(ric = %ric, batches, "finished instrument");
        Ok(())
    }

    /// Write the venue's result tables into `dir`.
    pub fn write_outputs(&self, dir: &Path) -> Result<()> {
        let label = self.venue_label();

        let trades_path = dir.join(format!("{label} Trades.csv"));
        output::write_trades_csv(&self.trade_rows, &trades_path)
            .with_context(|| format!("writing {}", trades_path.display()))?;

        let quotes_path = dir.join(format!("{label} Quotes.csv"));
        output::write_quotes_csv(&self.quote_rows, &quotes_path)
            .with_context(|| format!("writing {}", quotes_path.display()))?;

        if self.config.trades.distribution_interval_secs.is_some() {
            let dist_path = dir.join(format!("{label} Distribution.csv"));
            output::write_distribution_csv(&self.distribution, &dist_path)
                .with_context(|| format!("writing {}", dist_path.display()))?;
        }

        info!(
            trades = self.trade_rows.len(),
            quotes = self.quote_rows.len(),
            "wrote venue outputs"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn line(date: &str, time: &str, typ: &str, fields: &str, qualifiers: &str) -> String {
        // ric,date,time,offset,type,contributor,price,volume,bid px,bid sz,ask px,ask sz,quals
        format!("BMWG.DE,{date},{time},0,{typ},XET,{fields},{qualifiers}")
    }

    fn trade(date: &str, time: &str, price: f64, volume: f64) -> String {
        line(date, time, "Trade", &format!("{price},{volume},,,,"), " [ACT_FLAG1]")
    }

    fn quote(date: &str, time: &str, bid: f64, ask: f64) -> String {
        line(date, time, "Quote", &format!(",,{bid},100,{ask},200"), "")
    }

    /// Two-day fixture: day one is the known four-trade scenario plus two
    /// quotes, day two has two trades and a lone quote. An off-session
    /// trade and a cancelled trade exercise the filters.
    fn fixture_lines() -> Vec<String> {
        vec![
            line("2017-09-25", "08:00:00.000", "Trade", "50,1,,,,", " [ACT_FLAG1]"),
            trade("2017-09-25", "09:00:00.000", 100.0, 10.0),
            quote("2017-09-25", "09:00:00.000", 85.4, 85.6),
            trade("2017-09-25", "09:00:05.000", 101.0, 20.0),
            trade("2017-09-25", "09:00:10.000", 99.0, 30.0),
            trade("2017-09-25", "09:00:15.000", 102.0, 40.0),
            line("2017-09-25", "09:01:00.000", "Trade", "999,999,,,,", " [CANCELLED]"),
            quote("2017-09-25", "09:03:20.000", 90.0, 91.0),
            trade("2017-09-26", "09:00:00.000", 100.0, 1.0),
            quote("2017-09-26", "09:30:00.000", 86.0, 86.2),
            trade("2017-09-26", "10:00:00.000", 110.0, 1.0),
        ]
    }

    fn write_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("TAQ_BMWG.DE_20170925_20170927.csv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(fixture_lines().join("\n").as_bytes()).unwrap();
        enc.finish().unwrap();
        path
    }

    fn pipeline_with_chunk_size(dir: &Path, chunk_size: usize) -> VenuePipeline {
        let mut config = Config::default();
        config.source.input_folder = dir.to_path_buf();
        config.reader.chunk_size = chunk_size;
        VenuePipeline::new(config).unwrap()
    }

    #[test]
    fn test_end_to_end_run() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let mut pipeline = pipeline_with_chunk_size(dir.path(), 3);
        assert_eq!(pipeline.files().len(), 1);

        pipeline.build_index().unwrap();
        let index_path = pipeline.index_path(dir.path());
        pipeline.save_index(&index_path).unwrap();

        // Fresh pipeline, loading instead of rebuilding.
        let mut pipeline = pipeline_with_chunk_size(dir.path(), 3);
        pipeline.load_index(&index_path).unwrap();
        pipeline.process_all().unwrap();

        let trades = pipeline.trade_rows();
        assert_eq!(trades.len(), 2);
        let day1 = &trades[0];
        assert_eq!(day1.tick_count, 4);
        assert_eq!(day1.total_volume, 100.0);
        assert_eq!(day1.open, Some(100.0));
        assert_eq!(day1.close, Some(102.0));
        assert_eq!(day1.high, Some(102.0));
        assert_eq!(day1.low, Some(99.0));
        assert_relative_eq!(day1.dollar_volume, 19070.0, epsilon = 1e-9);

        let day2 = &trades[1];
        assert_eq!(day2.tick_count, 2);
        assert_relative_eq!(day2.dollar_volume, 210.0, epsilon = 1e-9);
        assert_eq!(day2.weighted_price, Some(100.0));

        // Day two has a lone quote and is omitted from the quote table.
        let quotes = pipeline.quote_rows();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].quote_count, 2);
        assert_relative_eq!(quotes[0].bid_price, 85.4, epsilon = 1e-12);
        assert_relative_eq!(quotes[0].ask_price, 85.6, epsilon = 1e-12);

        pipeline.write_outputs(dir.path()).unwrap();
        let label = pipeline.venue_label();
        let trades_csv =
            std::fs::read_to_string(dir.path().join(format!("{label} Trades.csv"))).unwrap();
        assert_eq!(trades_csv.lines().count(), 3);
        assert!(trades_csv.contains("BMWG.DE,2017-09-25,19070.0,"));
    }

    #[test]
    fn test_chunk_size_does_not_change_results() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let mut results = Vec::new();
        for chunk_size in [1, 2, 3, 7, 10_000] {
            let mut pipeline = pipeline_with_chunk_size(dir.path(), chunk_size);
            pipeline.build_index().unwrap();
            pipeline.process_all().unwrap();
            results.push((
                pipeline.trade_rows().to_vec(),
                pipeline.quote_rows().to_vec(),
            ));
        }

        let (ref_trades, ref_quotes) = &results[0];
        for (trades, quotes) in &results[1..] {
            assert_eq!(trades.len(), ref_trades.len());
            assert_eq!(quotes.len(), ref_quotes.len());
            for (a, b) in trades.iter().zip(ref_trades) {
                assert_eq!(a.date, b.date);
                assert_eq!(a.tick_count, b.tick_count);
                assert_eq!(a.total_volume, b.total_volume);
                assert_eq!(a.dollar_volume, b.dollar_volume);
                assert_eq!(a.open, b.open);
                assert_eq!(a.close, b.close);
                assert_eq!(a.high, b.high);
                assert_eq!(a.low, b.low);
                match (a.weighted_price, b.weighted_price) {
                    (Some(x), Some(y)) => assert_relative_eq!(x, y, epsilon = 1e-12),
                    (x, y) => assert_eq!(x, y),
                }
            }
            for (a, b) in quotes.iter().zip(ref_quotes) {
                assert_eq!(a.date, b.date);
                assert_eq!(a.quote_count, b.quote_count);
                assert_relative_eq!(a.bid_price, b.bid_price, epsilon = 1e-12);
                assert_relative_eq!(a.rel_spread, b.rel_spread, epsilon = 1e-12);
                assert_relative_eq!(a.realized_vol, b.realized_vol, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_process_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let mut pipeline = pipeline_with_chunk_size(dir.path(), 3);
        let err = pipeline.process_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Index(_))
        ));
    }

    #[test]
    fn test_cancellation_between_chunks() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let mut pipeline = pipeline_with_chunk_size(dir.path(), 3);
        pipeline.build_index().unwrap();
        pipeline.cancel_flag().store(true, Ordering::Relaxed);

        let err = pipeline.process_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Cancelled)
        ));
    }

    #[test]
    fn test_event_distribution_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let mut config = Config::default();
        config.source.input_folder = dir.path().to_path_buf();
        config.trades.distribution_interval_secs = Some(60);
        let mut pipeline = VenuePipeline::new(config).unwrap();
        pipeline.build_index().unwrap();
        pipeline.process_all().unwrap();

        // Day one sits in a single interval (no interior); day two spans
        // 09:00 to 10:00 with 59 empty interior minutes.
        assert_eq!(pipeline.distribution().get(&0), Some(&59));
    }

    #[test]
    fn test_venue_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.source.input_folder = dir.path().to_path_buf();
        config.source.venue_filter = ".BS_".to_string();

        // Label combines the folder basename and the cleaned filter.
        let pipeline = VenuePipeline::new(config).unwrap();
        let label = pipeline.venue_label();
        assert!(label.ends_with(" BS"));
    }
}
