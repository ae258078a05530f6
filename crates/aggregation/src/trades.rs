//! Per-day trade aggregation.
//!
//! Reduces a date-sorted session trade stream to one summary row per day:
//! dollar volume, return and price dispersion, the time-weighted average
//! price, tick/volume totals, and OHLC. All statistics are
//! missing-value-aware: a tick with an unparsable price or volume
//! contributes only to the aggregates it has data for.

use tickday_core::{TradeDaily, TradeTick};

use crate::stats::{day_slices, sample_std};

/// Aggregate a date-sorted session trade stream into one row per day.
///
/// Days are never compared across: the first return of a day is not
/// computed against the previous day's close, and the last tick of a day
/// carries no forward time weight.
pub fn aggregate_trades(ric: &str, trades: &[TradeTick]) -> Vec<TradeDaily> {
    day_slices(trades, |t| t.date)
        .into_iter()
        .map(|day| aggregate_day(ric, day))
        .collect()
}

fn aggregate_day(ric: &str, ticks: &[TradeTick]) -> TradeDaily {
    let mut dollar_volume = 0.0;
    let mut total_volume = 0.0;
    for t in ticks {
        if let (Some(p), Some(v)) = (t.price, t.volume) {
            dollar_volume += p * v;
        }
        if let Some(v) = t.volume {
            total_volume += v;
        }
    }

    // Tick-to-tick returns against the immediately preceding tick; a
    // missing price on either side drops the pair.
    let mut returns = Vec::new();
    for pair in ticks.windows(2) {
        if let (Some(prev), Some(p)) = (pair[0].price, pair[1].price) {
            if prev != 0.0 {
                returns.push(p / prev);
            }
        }
    }

    let prices: Vec<f64> = ticks.iter().filter_map(|t| t.price).collect();

    // Time-weighted price: each tick weighted by the delta to the next
    // tick of the same day, so the last tick carries no weight. The
    // divisor keeps deltas of price-less ticks, matching the
    // missing-value policy of the other sums.
    let mut weight_sum = 0.0;
    let mut weighted = 0.0;
    let mut priced_weight = false;
    for pair in ticks.windows(2) {
        let dt = (pair[1].time - pair[0].time).num_milliseconds() as f64;
        weight_sum += dt;
        if let Some(p) = pair[0].price {
            weighted += dt * p;
            priced_weight = true;
        }
    }
    let weighted_price = if weight_sum > 0.0 && priced_weight {
        Some(weighted / weight_sum)
    } else {
        None
    };

    TradeDaily {
        ric: ric.to_string(),
        date: ticks[0].date,
        dollar_volume,
        return_std: sample_std(&returns),
        price_std: sample_std(&prices),
        weighted_price,
        tick_count: ticks.len() as u64,
        total_volume,
        open: ticks.first().and_then(|t| t.price),
        close: ticks.last().and_then(|t| t.price),
        high: prices.iter().copied().reduce(f64::max),
        low: prices.iter().copied().reduce(f64::min),
    }
}
