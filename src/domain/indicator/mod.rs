//! Technical and fundamental indicators.
//!
//! Every indicator is a streaming type that owns a bounded history for one
//! instrument and is advanced once per bar with `update`, returning `None`
//! while it is still warming up. The `calculate_*` functions fold a streaming
//! indicator over a bar slice and return an [`IndicatorSeries`] for inspection.
//!
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters, labelling a series
//! - `IndicatorSeries`: A time series of indicator values

pub mod window;
pub mod sma;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod atr;
pub mod kdj;
pub mod acceleration;
pub mod momentum;
pub mod growth;
pub mod solvency;

pub use acceleration::{calculate_acceleration, Acceleration};
pub use atr::{calculate_atr, Atr};
pub use ema::{calculate_ema, Ema};
pub use growth::{GrowthValue, ProfitGrowth};
pub use kdj::{calculate_kdj, calculate_kdj_default, Kdj, KdjValue};
pub use macd::{calculate_macd, calculate_macd_default, Macd, MacdValue};
pub use momentum::{calculate_gated_momentum, GatedMomentum};
pub use rsi::{calculate_rsi, Rsi};
pub use sma::{calculate_sma, Sma};
pub use solvency::solvency;
pub use window::RollingWindow;

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Kdj {
        k: f64,
        d: f64,
        j: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj {
        period: usize,
        fast: usize,
        slow: usize,
    },
    Acceleration(usize),
    GatedMomentum {
        period: usize,
        k_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Feed `bars` through `step` in order, marking points where it returned
    /// `None` as invalid.
    pub fn from_stream<F>(indicator_type: IndicatorType, bars: &[OhlcvBar], mut step: F) -> Self
    where
        F: FnMut(&OhlcvBar) -> Option<IndicatorValue>,
    {
        let values = bars
            .iter()
            .map(|bar| match step(bar) {
                Some(value) => IndicatorPoint {
                    date: bar.date,
                    valid: true,
                    value,
                },
                None => IndicatorPoint {
                    date: bar.date,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                },
            })
            .collect();

        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    /// The scalar value at `index`, if that point is valid and simple.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj { period, fast, slow } => {
                write!(f, "KDJ({},{},{})", period, fast, slow)
            }
            IndicatorType::Acceleration(window) => write!(f, "ACC({})", window),
            IndicatorType::GatedMomentum { period, k_x100 } => {
                let k = *k_x100 as f64 / 100.0;
                write!(f, "MTM({},{})", period, k)
            }
        }
    }
}
