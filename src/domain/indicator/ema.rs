//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) updates are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    count: usize,
    seed_sum: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            count: 0,
            seed_sum: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, input: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }

        self.value = match self.value {
            Some(ema) => Some(input * self.k + ema * (1.0 - self.k)),
            None => {
                self.count += 1;
                self.seed_sum += input;
                (self.count == self.period).then(|| self.seed_sum / self.period as f64)
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let mut ema = Ema::new(period);
    IndicatorSeries::from_stream(IndicatorType::Ema(period), bars, |bar| {
        ema.update(bar.close).map(IndicatorValue::Simple)
    })
}
