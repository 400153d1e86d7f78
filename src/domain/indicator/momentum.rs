//! Volatility-gated momentum.
//!
//! Sums the last `period` one-bar returns, where a bar whose high/low ratio
//! reaches `k` contributes 0 instead of its return. Wide-range bars are
//! suppressed rather than amplified. The first bar has no return and yields
//! no value.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, RollingWindow};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_K: f64 = 1.08;

#[derive(Debug, Clone)]
pub struct GatedMomentum {
    k: f64,
    prev_close: Option<f64>,
    returns: RollingWindow,
    value: Option<f64>,
}

impl GatedMomentum {
    pub fn new(period: usize, k: f64) -> Self {
        Self {
            k,
            prev_close: None,
            returns: RollingWindow::new(period),
            value: None,
        }
    }

    /// True when the bar's range is too wide for its return to count.
    pub fn is_gated(&self, bar: &OhlcvBar) -> bool {
        bar.range_ratio().is_none_or(|ratio| ratio >= self.k)
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<f64> {
        let Some(prev_close) = self.prev_close.replace(bar.close) else {
            return None;
        };

        let ret = if self.is_gated(bar) {
            None
        } else {
            bar.return_from(prev_close)
        };
        self.returns.push(ret.unwrap_or(0.0));
        self.value = Some(self.returns.sum());
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Default for GatedMomentum {
    fn default() -> Self {
        GatedMomentum::new(DEFAULT_PERIOD, DEFAULT_K)
    }
}

pub fn calculate_gated_momentum(bars: &[OhlcvBar], period: usize, k: f64) -> IndicatorSeries {
    let mut mtm = GatedMomentum::new(period, k);
    let indicator_type = IndicatorType::GatedMomentum {
        period,
        k_x100: (k * 100.0).round() as u32,
    };
    IndicatorSeries::from_stream(indicator_type, bars, |bar| {
        mtm.update(bar).map(IndicatorValue::Simple)
    })
}
