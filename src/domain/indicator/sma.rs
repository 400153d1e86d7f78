//! Simple Moving Average.
//!
//! SMA(n)[i] = mean of the last n inputs. Warmup: first (n-1) updates are invalid.
//! Used over closes, volumes and traded values.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, RollingWindow};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone)]
pub struct Sma {
    window: RollingWindow,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push(value);
        self.window.mean()
    }

    pub fn value(&self) -> Option<f64> {
        self.window.mean()
    }

    pub fn period(&self) -> usize {
        self.window.capacity()
    }
}

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut sma = Sma::new(period);
    IndicatorSeries::from_stream(IndicatorType::Sma(period), bars, |bar| {
        sma.update(bar.close).map(IndicatorValue::Simple)
    })
}
