//! Grouping and dispersion helpers shared by the aggregators.

use chrono::NaiveDate;
use statrs::statistics::Statistics;

/// Sample standard deviation of `values`; `None` below two observations.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        None
    } else {
        Some(values.iter().std_dev())
    }
}

/// Split a date-sorted slice into per-day sub-slices.
pub(crate) fn day_slices<T>(items: &[T], date_of: impl Fn(&T) -> NaiveDate) -> Vec<&[T]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || date_of(&items[i]) != date_of(&items[start]) {
            out.push(&items[start..i]);
            start = i;
        }
    }
    out
}
