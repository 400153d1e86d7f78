//! Per-instrument bar history and the unified replay timeline.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub bars: Vec<OhlcvBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl CodeData {
    pub fn new(code: String, bars: Vec<OhlcvBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            bars,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }
}

/// Sorted union of every instrument's dates.
pub fn build_unified_timeline(codes: &[CodeData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = codes
        .iter()
        .flat_map(|cd| cd.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

/// The bars of every instrument trading on `date`, in instrument order.
pub fn bars_on(codes: &[CodeData], date: NaiveDate) -> Vec<OhlcvBar> {
    codes
        .iter()
        .filter_map(|cd| cd.get_bar(date).cloned())
        .collect()
}
