#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use factorsig::domain::code_data::CodeData;
use factorsig::domain::error::FactorsigError;
pub use factorsig::domain::fundamentals::Fundamentals;
pub use factorsig::domain::ohlcv::OhlcvBar;
use factorsig::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FactorsigError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(FactorsigError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_codes(&self) -> Result<Vec<String>, FactorsigError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000,
        traded_value: None,
        fundamentals: None,
    }
}

/// Healthy balance sheet passing every hard filter.
pub fn healthy_fundamentals(net_profit_after: f64, net_profit_z: f64) -> Fundamentals {
    Fundamentals {
        net_profit_after,
        net_profit_z,
        monetary_capital: 20.0,
        total_assets: 100.0,
        total_liabilities: 50.0,
        roe_after: 0.1,
        analyst_revision: 0.02,
        analyst_growth: 0.15,
        ..Default::default()
    }
}

/// Daily bars from `start` whose profit compounds at `growth` per bar, whose
/// profit proxy follows `growth * t^2` and whose close rises linearly at
/// `growth` of the starting price per bar. Turnover is a flat 1e6.
pub fn growth_bars(code: &str, start: NaiveDate, count: usize, growth: f64, price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = price * (1.0 + growth * t);
            OhlcvBar {
                fundamentals: Some(healthy_fundamentals(
                    100.0 * (1.0 + growth).powf(t),
                    growth * t * t,
                )),
                traded_value: Some(1_000_000.0),
                ..make_bar(code, start + Duration::days(i as i64), close)
            }
        })
        .collect()
}

/// Zig-zag closes on a 14-bar cycle with a slight upward drift.
pub fn swing_bars(code: &str, start: NaiveDate, count: usize) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let swing = ((i % 14) as f64 - 7.0).abs();
            let close = 100.0 + swing * 1.5 + i as f64 * 0.05;
            OhlcvBar {
                high: close + 1.0,
                low: close - 1.0,
                volume: 1000 + (i as i64 % 5) * 100,
                ..make_bar(code, start + Duration::days(i as i64), close)
            }
        })
        .collect()
}

pub fn make_code_data(code: &str, bars: Vec<OhlcvBar>) -> CodeData {
    CodeData::new(code.to_string(), bars)
}
