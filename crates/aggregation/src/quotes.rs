//! Per-day quote aggregation.
//!
//! Reduces a date-sorted session quote stream to one summary row per day:
//! time-weighted liquidity averages (bid/ask price and size, relative
//! spread), spread and mid-quote dispersion, and a realized volatility of
//! the log mid-quote estimated on a regular time grid. The grid estimator
//! exists because the raw tick series is irregular and bursty: a naive
//! tick-by-tick standard deviation over-weights dense quoting episodes,
//! so the series is interpolated onto evenly spaced samples first.

use chrono::{NaiveTime, Timelike};
use statrs::statistics::Statistics;
use tickday_core::{Config, QuoteDaily, QuoteTick};
use tracing::debug;

use crate::stats::{day_slices, sample_std};

/// Computes per-day quote summary rows.
pub struct QuoteAggregator {
    trim_prologue: bool,
    grid_interval_secs: u32,
}

/// A quote with all four fields resolved, ready for statistics.
#[derive(Debug, Clone, Copy)]
struct FilledQuote {
    time: NaiveTime,
    bid_price: f64,
    bid_size: f64,
    ask_price: f64,
    ask_size: f64,
}

impl FilledQuote {
    #[inline]
    fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    #[inline]
    fn mid(&self) -> f64 {
        (self.ask_price + self.bid_price) / 2.0
    }

    /// Relative spread in basis points.
    #[inline]
    fn rel_spread(&self) -> f64 {
        self.spread() / self.mid() * 10_000.0
    }

    /// Mean of log bid and log ask (the log of the geometric mid).
    #[inline]
    fn log_mid(&self) -> f64 {
        (self.bid_price.ln() + self.ask_price.ln()) / 2.0
    }
}

impl QuoteAggregator {
    /// Create a quote aggregator from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            trim_prologue: config.quotes.trim_prologue,
            grid_interval_secs: config.quotes.grid_interval_secs.max(1),
        }
    }

    /// Aggregate a date-sorted session quote stream into one row per day.
    ///
    /// Days without a single valid quote, or without any positive time
    /// weight (e.g. a lone quote), are omitted rather than emitted with
    /// degenerate statistics.
    pub fn aggregate(&self, ric: &str, quotes: &[QuoteTick]) -> Vec<QuoteDaily> {
        let mut rows = Vec::new();
        for day in day_slices(quotes, |q| q.date) {
            let filled = self.prepare_day(day);
            if filled.is_empty() {
                debug!(ric, date = %day[0].date, "no valid quotes, omitting day");
                continue;
            }
            match self.aggregate_day(ric, day[0].date, &filled) {
                Some(row) => rows.push(row),
                None => debug!(ric, date = %day[0].date, "zero time weight, omitting day"),
            }
        }
        rows
    }

    /// Forward-fill missing fields within the day, then apply the quote
    /// validity policy. The fill never crosses a day boundary.
    fn prepare_day(&self, day: &[QuoteTick]) -> Vec<FilledQuote> {
        let mut last_bid_price = None;
        let mut last_bid_size = None;
        let mut last_ask_price = None;
        let mut last_ask_size = None;
        let mut out = Vec::with_capacity(day.len());

        for q in day {
            last_bid_price = q.bid_price.or(last_bid_price);
            last_bid_size = q.bid_size.or(last_bid_size);
            last_ask_price = q.ask_price.or(last_ask_price);
            last_ask_size = q.ask_size.or(last_ask_size);

            let (Some(bid_price), Some(bid_size), Some(ask_price), Some(ask_size)) =
                (last_bid_price, last_bid_size, last_ask_price, last_ask_size)
            else {
                continue;
            };
            if self.trim_prologue
                && !(bid_price > 0.0 && bid_size > 0.0 && ask_price > 0.0 && ask_size > 0.0)
            {
                continue;
            }
            out.push(FilledQuote {
                time: q.time,
                bid_price,
                bid_size,
                ask_price,
                ask_size,
            });
        }
        out
    }

    fn aggregate_day(
        &self,
        ric: &str,
        date: chrono::NaiveDate,
        day: &[FilledQuote],
    ) -> Option<QuoteDaily> {
        // Time-weighted sums; each quote is weighted by the delta to the
        // next surviving quote, so the last one carries no weight.
        let mut dt_sum = 0.0;
        let mut bid_price_sum = 0.0;
        let mut bid_size_sum = 0.0;
        let mut ask_price_sum = 0.0;
        let mut ask_size_sum = 0.0;
        let mut rel_spread_sum = 0.0;
        for pair in day.windows(2) {
            let dt = (pair[1].time - pair[0].time).num_milliseconds() as f64;
            let q = &pair[0];
            dt_sum += dt;
            bid_price_sum += dt * q.bid_price;
            bid_size_sum += dt * q.bid_size;
            ask_price_sum += dt * q.ask_price;
            ask_size_sum += dt * q.ask_size;
            rel_spread_sum += dt * q.rel_spread();
        }
        if dt_sum <= 0.0 {
            return None;
        }

        let spreads: Vec<f64> = day.iter().map(FilledQuote::spread).collect();
        let mids: Vec<f64> = day.iter().map(FilledQuote::mid).collect();

        Some(QuoteDaily {
            ric: ric.to_string(),
            date,
            quote_count: day.len() as u64,
            spread_std: sample_std(&spreads),
            mid_std: sample_std(&mids),
            realized_vol: self.realized_vol(day),
            bid_price: bid_price_sum / dt_sum,
            bid_size: bid_size_sum / dt_sum,
            ask_price: ask_price_sum / dt_sum,
            ask_size: ask_size_sum / dt_sum,
            rel_spread: rel_spread_sum / dt_sum,
        })
    }

    /// Realized volatility of the log mid-quote.
    ///
    /// The log mid is sampled onto a regular grid aligned to round clock
    /// multiples of the interval and confined to the day's observed
    /// first/last quote times, by linear interpolation in time between the
    /// bracketing observations. Consecutive duplicate samples are dropped
    /// (zero-variance runs from quiet periods would bias the estimate
    /// toward zero); the result is the population standard deviation of
    /// the surviving samples, and 0 when fewer than two survive.
    fn realized_vol(&self, day: &[FilledQuote]) -> f64 {
        // Collapse same-millisecond observations, keeping the last.
        let mut obs: Vec<(i64, f64)> = Vec::with_capacity(day.len());
        for q in day {
            let t = ms_of_day(q.time);
            let v = q.log_mid();
            match obs.last_mut() {
                Some(last) if last.0 == t => last.1 = v,
                _ => obs.push((t, v)),
            }
        }
        if obs.is_empty() {
            return 0.0;
        }

        let step = self.grid_interval_secs as i64 * 1000;
        let first = obs[0].0;
        let last = obs[obs.len() - 1].0;
        let end = last.div_euclid(step) * step;
        let mut t = (first + step - 1).div_euclid(step) * step;

        let mut grid: Vec<f64> = Vec::new();
        let mut i = 0usize;
        while t <= end {
            while i + 1 < obs.len() && obs[i + 1].0 <= t {
                i += 1;
            }
            let v = if obs[i].0 == t {
                obs[i].1
            } else {
                let (t0, v0) = obs[i];
                let (t1, v1) = obs[i + 1];
                v0 + (v1 - v0) * ((t - t0) as f64) / ((t1 - t0) as f64)
            };
            if grid.last() != Some(&v) {
                grid.push(v);
            }
            t += step;
        }

        if grid.len() < 2 {
            0.0
        } else {
            grid.iter().population_std_dev()
        }
    }
}

/// Milliseconds since midnight.
#[inline]
fn ms_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64
}
