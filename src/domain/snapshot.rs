//! Factor snapshot builder.
//!
//! [`FactorRegistry`] owns one [`InstrumentFactors`] bundle per instrument,
//! created when the universe is set up and looked up by code. Each bundle is
//! advanced once per bar; [`FactorRegistry::snapshot`] materializes the
//! current factor values of every instrument that traded on a date.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator::{
    acceleration, momentum, solvency, Acceleration, GatedMomentum, ProfitGrowth, Sma,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_VALUE_WINDOW: usize = 5;

/// Windows and thresholds of the selection-path indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorParams {
    pub acceleration_window: usize,
    pub momentum_period: usize,
    pub momentum_k: f64,
    pub value_window: usize,
}

impl Default for FactorParams {
    fn default() -> Self {
        FactorParams {
            acceleration_window: acceleration::DEFAULT_WINDOW,
            momentum_period: momentum::DEFAULT_PERIOD,
            momentum_k: momentum::DEFAULT_K,
            value_window: DEFAULT_VALUE_WINDOW,
        }
    }
}

/// Factor values of one instrument on one date. `None` marks a factor that
/// is undefined (warmup, zero denominator, missing fundamentals).
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRow {
    pub code: String,
    pub ttm_growth: Option<f64>,
    pub acceleration: Option<f64>,
    pub npap_ratio: Option<f64>,
    pub solvency: Option<f64>,
    pub roe: Option<f64>,
    pub avg_value: Option<f64>,
    pub momentum: Option<f64>,
    pub analyst_revision: Option<f64>,
    pub analyst_growth: Option<f64>,
    pub recent_issuance: bool,
    pub is_st: bool,
    pub is_halted: bool,
    pub volume: i64,
}

impl FactorRow {
    /// Every scored factor is defined.
    pub fn is_complete(&self) -> bool {
        [
            self.ttm_growth,
            self.acceleration,
            self.npap_ratio,
            self.solvency,
            self.roe,
            self.avg_value,
            self.momentum,
            self.analyst_revision,
            self.analyst_growth,
        ]
        .iter()
        .all(Option::is_some)
    }

    pub fn is_untradeable(&self) -> bool {
        self.is_halted || self.volume == 0
    }
}

#[derive(Debug, Clone)]
pub struct FactorSnapshot {
    pub date: NaiveDate,
    /// Universe order.
    pub rows: Vec<FactorRow>,
}

impl FactorSnapshot {
    pub fn get(&self, code: &str) -> Option<&FactorRow> {
        self.rows.iter().find(|r| r.code == code)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Indicator state of one instrument on the selection path.
#[derive(Debug, Clone)]
pub struct InstrumentFactors {
    code: String,
    growth: ProfitGrowth,
    acceleration: Acceleration,
    momentum: GatedMomentum,
    avg_value: Sma,
    fundamentals: Option<Fundamentals>,
    last_bar: Option<OhlcvBar>,
}

impl InstrumentFactors {
    pub fn new(code: &str, params: &FactorParams) -> Self {
        Self {
            code: code.to_string(),
            growth: ProfitGrowth::new(),
            acceleration: Acceleration::new(params.acceleration_window),
            momentum: GatedMomentum::new(params.momentum_period, params.momentum_k),
            avg_value: Sma::new(params.value_window),
            fundamentals: None,
            last_bar: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Price and turnover factors advance on every bar; fundamental ones only
    /// on bars that carry fundamentals. The latest fundamentals stay in force
    /// until the next report.
    pub fn update(&mut self, bar: &OhlcvBar) {
        self.momentum.update(bar);
        self.avg_value.update(bar.value_traded());
        if let Some(f) = &bar.fundamentals {
            self.growth.update(f.net_profit_after);
            self.acceleration.update(f.net_profit_z);
            self.fundamentals = Some(f.clone());
        }
        self.last_bar = Some(bar.clone());
    }

    /// Current factor row, if this instrument has a bar on `date`.
    pub fn row(&self, date: NaiveDate) -> Option<FactorRow> {
        let bar = self.last_bar.as_ref().filter(|b| b.date == date)?;
        let f = self.fundamentals.as_ref();
        let growth = self.growth.value();

        Some(FactorRow {
            code: self.code.clone(),
            ttm_growth: growth.ttm_growth,
            acceleration: self.acceleration.value(),
            npap_ratio: growth.npap_ratio,
            solvency: f.and_then(solvency),
            roe: f.map(|f| f.roe_after),
            avg_value: self.avg_value.value(),
            momentum: self.momentum.value(),
            analyst_revision: f.map(|f| f.analyst_revision),
            analyst_growth: f.map(|f| f.analyst_growth),
            recent_issuance: f.is_some_and(|f| f.recent_issuance),
            is_st: f.is_some_and(|f| f.is_st),
            is_halted: bar.is_halted(),
            volume: bar.volume,
        })
    }
}

/// Per-instrument factor state, keyed by code in universe order.
#[derive(Debug, Clone)]
pub struct FactorRegistry {
    params: FactorParams,
    instruments: Vec<InstrumentFactors>,
    index: HashMap<String, usize>,
}

impl FactorRegistry {
    pub fn new(codes: &[String], params: FactorParams) -> Self {
        let instruments: Vec<InstrumentFactors> = codes
            .iter()
            .map(|code| InstrumentFactors::new(code, &params))
            .collect();
        let index = build_index(&instruments);
        Self {
            params,
            instruments,
            index,
        }
    }

    pub fn params(&self) -> &FactorParams {
        &self.params
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(|i| i.code())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&InstrumentFactors> {
        self.index.get(code).map(|&i| &self.instruments[i])
    }

    /// Drops the state of an instrument leaving the universe.
    pub fn remove(&mut self, code: &str) -> bool {
        let Some(i) = self.index.get(code).copied() else {
            return false;
        };
        self.instruments.remove(i);
        self.index = build_index(&self.instruments);
        true
    }

    /// Advance the bundles for a batch of bars. Bars for unknown codes are
    /// ignored; bars of one instrument are applied in slice order.
    pub fn update(&mut self, bars: &[OhlcvBar]) {
        let groups = self.group(bars);
        for (instrument, bars) in self.instruments.iter_mut().zip(groups) {
            for bar in bars {
                instrument.update(bar);
            }
        }
    }

    /// Same as [`update`](Self::update) with instruments processed on the
    /// rayon pool. Instrument states are disjoint, so the result is identical.
    pub fn update_parallel(&mut self, bars: &[OhlcvBar]) {
        let groups = self.group(bars);
        self.instruments
            .par_iter_mut()
            .zip(groups.into_par_iter())
            .for_each(|(instrument, bars)| {
                for bar in bars {
                    instrument.update(bar);
                }
            });
    }

    pub fn snapshot(&self, date: NaiveDate) -> FactorSnapshot {
        FactorSnapshot {
            date,
            rows: self.instruments.iter().filter_map(|i| i.row(date)).collect(),
        }
    }

    fn group<'a>(&self, bars: &'a [OhlcvBar]) -> Vec<Vec<&'a OhlcvBar>> {
        let mut groups: Vec<Vec<&OhlcvBar>> = vec![Vec::new(); self.instruments.len()];
        for bar in bars {
            match self.index.get(&bar.code) {
                Some(&i) => groups[i].push(bar),
                None => debug!(code = %bar.code, "bar for instrument outside the universe"),
            }
        }
        groups
    }
}

fn build_index(instruments: &[InstrumentFactors]) -> HashMap<String, usize> {
    instruments
        .iter()
        .enumerate()
        .map(|(i, inst)| (inst.code().to_string(), i))
        .collect()
}
