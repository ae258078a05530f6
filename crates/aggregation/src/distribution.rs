//! Intraday event-count distribution (diagnostic).
//!
//! Buckets each day's trades into fixed-length, clock-aligned intervals
//! and histograms "intervals holding exactly k trades". The first and
//! last occupied intervals of a day are partial and excluded; interior
//! intervals without a single trade are counted under k = 0 via the
//! complement of the regular grid. Per-day histograms merge by addition.

use std::collections::BTreeMap;

use chrono::Timelike;
use tickday_core::TradeTick;

use crate::stats::day_slices;

/// Frequency of interval occupancy: trades-per-interval -> interval count.
pub type EventHistogram = BTreeMap<u64, u64>;

/// Distribution over every day in a date-sorted session trade stream.
pub fn event_distribution(trades: &[TradeTick], interval_secs: u32) -> EventHistogram {
    let mut merged = EventHistogram::new();
    for day in day_slices(trades, |t| t.date) {
        merge(&mut merged, &day_distribution(day, interval_secs));
    }
    merged
}

/// Distribution for a single day's trades.
pub fn day_distribution(day: &[TradeTick], interval_secs: u32) -> EventHistogram {
    let interval = interval_secs.max(1) as u64;
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for t in day {
        let idx = t.time.num_seconds_from_midnight() as u64 / interval;
        *counts.entry(idx).or_insert(0) += 1;
    }

    let mut hist = EventHistogram::new();
    let (Some(&first), Some(&last)) = (
        counts.keys().next(),
        counts.keys().next_back(),
    ) else {
        return hist;
    };

    // Interior intervals only: the first and last occupied intervals are
    // partial (the session does not start or end on an interval boundary).
    let mut empty = 0u64;
    for idx in (first + 1)..last {
        match counts.get(&idx) {
            Some(&n) => *hist.entry(n).or_insert(0) += 1,
            None => empty += 1,
        }
    }
    hist.insert(0, empty);
    hist
}

/// Add `other`'s interval counts into `into`.
pub fn merge(into: &mut EventHistogram, other: &EventHistogram) {
    for (&k, &n) in other {
        *into.entry(k).or_insert(0) += n;
    }
}
