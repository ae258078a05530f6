//! Result-table CSV output.
//!
//! One trades file and one quotes file per venue, column names matching
//! the legacy tables; the optional event distribution gets a third file.

use std::path::Path;

use tickday_aggregation::EventHistogram;
use tickday_core::{QuoteDaily, Result, TradeDaily};

/// Write the per-day trade table.
pub fn write_trades_csv(rows: &[TradeDaily], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the per-day quote table.
pub fn write_quotes_csv(rows: &[QuoteDaily], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the event-count distribution.
pub fn write_distribution_csv(hist: &EventHistogram, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["events", "intervals"])?;
    for (k, n) in hist {
        wtr.write_record([k.to_string(), n.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
