//! Session filtering and stream classification.
//!
//! Aligns each record to the local venue clock (its own GMT offset plus a
//! fixed configurable shift), keeps only records inside the official
//! trading session, and splits the survivors into trade and quote streams.

use chrono::{Duration, NaiveTime};
use tickday_core::{Config, QuoteTick, RecordType, TickRecord, TradeTick};

/// Classifies raw records into session trade/quote streams.
pub struct SessionFilter {
    start: NaiveTime,
    end: NaiveTime,
    local_shift: Duration,
    active_flag: String,
}

impl SessionFilter {
    /// Create a session filter from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            start: config.session.start,
            end: config.session.end,
            local_shift: Duration::hours(config.session.local_time_shift_hours),
            active_flag: config.trades.active_flag_marker.clone(),
        }
    }

    /// A record's time on the local venue clock.
    #[inline]
    fn local_time(&self, rec: &TickRecord) -> NaiveTime {
        rec.time + Duration::hours(rec.gmt_offset as i64) + self.local_shift
    }

    /// Split a day-clean batch into session trades and quotes.
    ///
    /// Records outside the session window are dropped, not carried to the
    /// next day. Trades must additionally carry the active-flag qualifier.
    pub fn split(&self, batch: &[TickRecord]) -> (Vec<TradeTick>, Vec<QuoteTick>) {
        let mut trades = Vec::new();
        let mut quotes = Vec::new();
        for rec in batch {
            let time = self.local_time(rec);
            if time < self.start || time > self.end {
                continue;
            }
            match rec.record_type {
                RecordType::Trade => {
                    if rec.qualifiers.starts_with(&self.active_flag) {
                        trades.push(TradeTick {
                            date: rec.date,
                            time,
                            price: rec.price,
                            volume: rec.volume,
                        });
                    }
                }
                RecordType::Quote => {
                    quotes.push(QuoteTick {
                        date: rec.date,
                        time,
                        bid_price: rec.bid_price,
                        bid_size: rec.bid_size,
                        ask_price: rec.ask_price,
                        ask_size: rec.ask_size,
                    });
                }
                RecordType::Other => {}
            }
        }
        (trades, quotes)
    }
}
