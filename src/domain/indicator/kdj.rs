//! KDJ oscillator built on the slow stochastic.
//!
//! raw %K = 100 * (close - lowest_low(n)) / (highest_high(n) - lowest_low(n))
//! %K = SMA(fast) of raw %K, %D = SMA(slow) of %K, J = 3*%K - 2*%D.
//! A flat lookback range (highest == lowest) yields a neutral raw %K of 50.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, RollingWindow, Sma};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 9;
pub const DEFAULT_FAST: usize = 3;
pub const DEFAULT_SLOW: usize = 3;

const NEUTRAL_RAW_K: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjValue {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl KdjValue {
    /// J moved from below both K and D on `prev` to above both on `self`.
    pub fn j_crossed_above(&self, prev: &KdjValue) -> bool {
        prev.j < prev.k && prev.j < prev.d && self.j > self.k && self.j > self.d
    }

    /// J moved from above both K and D on `prev` to below both on `self`.
    pub fn j_crossed_below(&self, prev: &KdjValue) -> bool {
        prev.j > prev.k && prev.j > prev.d && self.j < self.k && self.j < self.d
    }
}

#[derive(Debug, Clone)]
pub struct Kdj {
    highs: RollingWindow,
    lows: RollingWindow,
    k: Sma,
    d: Sma,
    value: Option<KdjValue>,
}

impl Kdj {
    pub fn new(period: usize, fast: usize, slow: usize) -> Self {
        Self {
            highs: RollingWindow::new(period),
            lows: RollingWindow::new(period),
            k: Sma::new(fast),
            d: Sma::new(slow),
            value: None,
        }
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<KdjValue> {
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        if !self.highs.is_full() {
            return None;
        }

        let (Some(highest), Some(lowest)) = (self.highs.max(), self.lows.min()) else {
            return None;
        };
        let range = highest - lowest;
        let raw_k = if range == 0.0 {
            NEUTRAL_RAW_K
        } else {
            100.0 * (bar.close - lowest) / range
        };

        self.value = self.k.update(raw_k).and_then(|k| {
            self.d.update(k).map(|d| KdjValue {
                k,
                d,
                j: 3.0 * k - 2.0 * d,
            })
        });
        self.value
    }

    pub fn value(&self) -> Option<KdjValue> {
        self.value
    }
}

impl Default for Kdj {
    fn default() -> Self {
        Kdj::new(DEFAULT_PERIOD, DEFAULT_FAST, DEFAULT_SLOW)
    }
}

pub fn calculate_kdj(bars: &[OhlcvBar], period: usize, fast: usize, slow: usize) -> IndicatorSeries {
    let mut kdj = Kdj::new(period, fast, slow);
    IndicatorSeries::from_stream(IndicatorType::Kdj { period, fast, slow }, bars, |bar| {
        kdj.update(bar)
            .map(|v| IndicatorValue::Kdj { k: v.k, d: v.d, j: v.j })
    })
}

pub fn calculate_kdj_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_kdj(bars, DEFAULT_PERIOD, DEFAULT_FAST, DEFAULT_SLOW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(hlc: &[(f64, f64, f64)]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        hlc.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| OhlcvBar {
                code: "TEST".into(),
                date: start + Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000,
                traded_value: None,
                fundamentals: None,
            })
            .collect()
    }

    #[test]
    fn kdj_warmup_default() {
        let hlc: Vec<(f64, f64, f64)> = (0..20)
            .map(|i| (101.0 + i as f64, 99.0 + i as f64, 100.0 + i as f64))
            .collect();
        let series = calculate_kdj_default(&make_bars(&hlc));

        // lookback fills at 8, K at 10, D at 12
        assert_eq!(series.first_valid_index(), Some(12));
    }

    #[test]
    fn kdj_j_is_three_k_minus_two_d() {
        let hlc: Vec<(f64, f64, f64)> = (0..30)
            .map(|i| {
                let c = 100.0 + ((i * 7) % 11) as f64;
                (c + 2.0, c - 3.0, c)
            })
            .collect();
        let series = calculate_kdj_default(&make_bars(&hlc));

        for point in series.values.iter().filter(|p| p.valid) {
            if let IndicatorValue::Kdj { k, d, j } = point.value {
                assert!((j - (3.0 * k - 2.0 * d)).abs() < 1e-9);
                assert!((0.0..=100.0).contains(&k));
                assert!((0.0..=100.0).contains(&d));
            } else {
                panic!("Expected Kdj value");
            }
        }
    }

    #[test]
    fn kdj_flat_range_is_neutral() {
        let mut kdj = Kdj::new(3, 1, 1);
        let bars = make_bars(&[(10.0, 10.0, 10.0); 3]);
        let mut last = None;
        for bar in &bars {
            last = kdj.update(bar);
        }
        let v = last.unwrap();
        assert_eq!(v.k, 50.0);
        assert_eq!(v.d, 50.0);
        assert_eq!(v.j, 50.0);
    }

    #[test]
    fn kdj_close_at_high_is_100() {
        let mut kdj = Kdj::new(2, 1, 1);
        let bars = make_bars(&[(10.0, 5.0, 6.0), (12.0, 8.0, 12.0)]);
        kdj.update(&bars[0]);
        let v = kdj.update(&bars[1]).unwrap();
        assert!((v.k - 100.0).abs() < f64::EPSILON);
        assert_eq!(kdj.value(), Some(v));
    }

    #[test]
    fn cross_above_requires_both_lines() {
        let prev = KdjValue { k: 50.0, d: 45.0, j: 40.0 };
        let up = KdjValue { k: 52.0, d: 48.0, j: 60.0 };
        assert!(up.j_crossed_above(&prev));
        assert!(!up.j_crossed_below(&prev));

        let between = KdjValue { k: 52.0, d: 48.0, j: 50.0 };
        assert!(!between.j_crossed_above(&prev));

        let prev_between = KdjValue { k: 50.0, d: 35.0, j: 40.0 };
        assert!(!up.j_crossed_above(&prev_between));
    }

    #[test]
    fn cross_below_mirrors() {
        let prev = KdjValue { k: 50.0, d: 55.0, j: 70.0 };
        let down = KdjValue { k: 48.0, d: 52.0, j: 30.0 };
        assert!(down.j_crossed_below(&prev));
        assert!(!down.j_crossed_above(&prev));
    }
}
