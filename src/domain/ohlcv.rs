//! OHLCV bar representation.

use chrono::NaiveDate;

use super::fundamentals::Fundamentals;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    /// Turnover in currency as reported by the feed.
    pub traded_value: Option<f64>,
    /// Present only on feeds that drive the selection engine.
    pub fundamentals: Option<Fundamentals>,
}

impl OhlcvBar {
    /// Largest of the bar's own range and both gaps from `prev_close`.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        (self.high - self.low)
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }

    /// high / low, undefined for a non-positive low.
    pub fn range_ratio(&self) -> Option<f64> {
        (self.low > 0.0).then(|| self.high / self.low)
    }

    /// close / prev_close - 1, undefined for a non-positive previous close.
    pub fn return_from(&self, prev_close: f64) -> Option<f64> {
        (prev_close > 0.0).then(|| self.close / prev_close - 1.0)
    }

    /// Reported turnover, or close × volume when the feed has none.
    pub fn value_traded(&self) -> f64 {
        self.traded_value
            .unwrap_or(self.close * self.volume as f64)
    }

    /// A bar that never traded away from one price is treated as halted or
    /// locked at its limit.
    pub fn is_halted(&self) -> bool {
        self.high == self.low
    }

    pub fn is_untradeable(&self) -> bool {
        self.is_halted() || self.volume == 0
    }
}
