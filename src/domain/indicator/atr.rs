//! Average True Range.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|), defined from
//! the second bar on. ATR(n) = simple mean of the last n true ranges.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, Sma};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 15;

#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    tr: Sma,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            tr: Sma::new(period),
        }
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<f64> {
        match self.prev_close.replace(bar.close) {
            Some(prev_close) => self.tr.update(bar.true_range(prev_close)),
            None => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.tr.value()
    }
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut atr = Atr::new(period);
    IndicatorSeries::from_stream(IndicatorType::Atr(period), bars, |bar| {
        atr.update(bar).map(IndicatorValue::Simple)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
            traded_value: None,
            fundamentals: None,
        }
    }

    #[test]
    fn atr_warmup_needs_prev_close() {
        let bars: Vec<OhlcvBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();

        let series = calc(&bars, 3);
        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    fn calc(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
        calculate_atr(bars, period)
    }

    #[test]
    fn atr_is_simple_mean_of_true_range() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 130.0, 120.0, 125.0),
            make_bar(4, 125.0, 115.0, 120.0),
        ];

        let series = calc(&bars, 2);
        // TR: bar2 = 10, bar3 = max(10, 20, 10) = 20, bar4 = max(10, 0, 10) = 10
        assert!((series.simple_at(2).unwrap() - 15.0).abs() < 1e-9);
        assert!((series.simple_at(3).unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn atr_streaming_matches_batch() {
        let bars: Vec<OhlcvBar> = (1..=10)
            .map(|d| make_bar(d, 100.0 + d as f64, 95.0 + d as f64 * 0.5, 98.0 + d as f64))
            .collect();
        let series = calc(&bars, 4);

        let mut atr = Atr::new(4);
        for (i, bar) in bars.iter().enumerate() {
            assert_eq!(atr.update(bar), series.simple_at(i));
        }
        assert_eq!(atr.value(), series.simple_at(9));
    }
}
