//! Core data types for the tickday pipeline.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Record type of a raw tick line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// An executed trade print.
    Trade,
    /// A best bid/ask update.
    Quote,
    /// Auction messages, corrections, market status and other line types.
    Other,
}

impl RecordType {
    /// Map the raw type column onto a record type.
    pub fn from_field(s: &str) -> Self {
        match s {
            "Trade" => RecordType::Trade,
            "Quote" => RecordType::Quote,
            _ => RecordType::Other,
        }
    }

    #[inline]
    pub fn is_trade(self) -> bool {
        self == RecordType::Trade
    }

    #[inline]
    pub fn is_quote(self) -> bool {
        self == RecordType::Quote
    }
}

/// One raw record as read from a tick-history file.
///
/// Measure fields (price, volume, bid/ask price and size) are `None` when
/// the source field is empty or unparsable. Structural fields (date, time,
/// GMT offset, type) are guaranteed valid by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    /// Instrument identifier (RIC).
    pub ric: String,
    /// Calendar date of the record.
    pub date: NaiveDate,
    /// Time of day in GMT, sub-second resolution.
    pub time: NaiveTime,
    /// Offset from GMT in whole hours.
    pub gmt_offset: i32,
    /// Record type (trade, quote, other).
    pub record_type: RecordType,
    /// Exchange/contributor id.
    pub contributor: String,
    /// Trade price.
    pub price: Option<f64>,
    /// Trade volume.
    pub volume: Option<f64>,
    /// Best bid price.
    pub bid_price: Option<f64>,
    /// Best bid size.
    pub bid_size: Option<f64>,
    /// Best ask price.
    pub ask_price: Option<f64>,
    /// Best ask size.
    pub ask_size: Option<f64>,
    /// Qualifier flags (correction/cancel markers, trade condition codes).
    pub qualifiers: String,
}

/// A trade observation inside the trading session, time already aligned
/// to the local venue clock.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTick {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub price: Option<f64>,
    pub volume: Option<f64>,
}

/// A quote observation inside the trading session, time already aligned
/// to the local venue clock.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTick {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub bid_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_price: Option<f64>,
    pub ask_size: Option<f64>,
}

impl QuoteTick {
    /// All four bid/ask fields are present.
    pub fn is_complete(&self) -> bool {
        self.bid_price.is_some()
            && self.bid_size.is_some()
            && self.ask_price.is_some()
            && self.ask_size.is_some()
    }

    /// All four bid/ask fields are present and strictly positive.
    pub fn is_crossable(&self) -> bool {
        matches!(
            (self.bid_price, self.bid_size, self.ask_price, self.ask_size),
            (Some(bp), Some(bs), Some(ap), Some(asz))
                if bp > 0.0 && bs > 0.0 && ap > 0.0 && asz > 0.0
        )
    }
}

/// Per-day trade aggregation row.
///
/// Serialized column names match the legacy output tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDaily {
    #[serde(rename = "ticker")]
    pub ric: String,
    pub date: NaiveDate,
    /// Dollar volume, sum of price times volume.
    #[serde(rename = "V")]
    pub dollar_volume: f64,
    /// Standard deviation of the tick-to-tick return.
    #[serde(rename = "sigma_r")]
    pub return_std: Option<f64>,
    /// Standard deviation of the trade price.
    #[serde(rename = "sigma_p")]
    pub price_std: Option<f64>,
    /// Time-weighted average trade price.
    #[serde(rename = "P")]
    pub weighted_price: Option<f64>,
    /// Trade tick count.
    #[serde(rename = "N")]
    pub tick_count: u64,
    /// Total traded volume.
    #[serde(rename = "X")]
    pub total_volume: f64,
    #[serde(rename = "Open")]
    pub open: Option<f64>,
    #[serde(rename = "Close")]
    pub close: Option<f64>,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
}

/// Per-day quote aggregation row.
///
/// Serialized column names match the legacy output tables. The bid/ask
/// price/size and relative-spread columns are time-weighted averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDaily {
    #[serde(rename = "ticker")]
    pub ric: String,
    pub date: NaiveDate,
    /// Quote count after validity filtering.
    #[serde(rename = "N")]
    pub quote_count: u64,
    /// Standard deviation of the absolute spread.
    #[serde(rename = "sigma_s")]
    pub spread_std: Option<f64>,
    /// Standard deviation of the mid-quote.
    #[serde(rename = "sigma_m")]
    pub mid_std: Option<f64>,
    /// Realized volatility of the log mid-quote on the regular grid.
    #[serde(rename = "sigma_m_log")]
    pub realized_vol: f64,
    pub bid_price: f64,
    pub bid_size: f64,
    pub ask_price: f64,
    pub ask_size: f64,
    pub rel_spread: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bp: Option<f64>, bs: Option<f64>, ap: Option<f64>, asz: Option<f64>) -> QuoteTick {
        QuoteTick {
            date: NaiveDate::from_ymd_opt(2017, 9, 25).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            bid_price: bp,
            bid_size: bs,
            ask_price: ap,
            ask_size: asz,
        }
    }

    #[test]
    fn test_record_type_from_field() {
        assert_eq!(RecordType::from_field("Trade"), RecordType::Trade);
        assert_eq!(RecordType::from_field("Quote"), RecordType::Quote);
        assert_eq!(RecordType::from_field("Auction"), RecordType::Other);
        assert_eq!(RecordType::from_field(""), RecordType::Other);
    }

    #[test]
    fn test_quote_completeness() {
        let q = quote(Some(10.0), Some(100.0), Some(10.1), Some(200.0));
        assert!(q.is_complete());
        assert!(q.is_crossable());

        let missing = quote(Some(10.0), None, Some(10.1), Some(200.0));
        assert!(!missing.is_complete());
        assert!(!missing.is_crossable());
    }

    #[test]
    fn test_zero_bid_is_not_crossable() {
        let q = quote(Some(0.0), Some(100.0), Some(10.1), Some(200.0));
        assert!(q.is_complete());
        assert!(!q.is_crossable());
    }
}
