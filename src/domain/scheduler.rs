//! Rebalance scheduler.
//!
//! A date triggers a rebalance when the calendar day before it falls on one
//! of the configured (month, day) pairs. The defaults follow the reporting
//! calendar: end of January, April, August and October, and mid-July.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

pub const DEFAULT_TRIGGERS: [(u32, u32); 5] = [(1, 31), (4, 30), (7, 15), (8, 31), (10, 31)];

#[derive(Debug, Clone)]
pub struct RebalanceScheduler {
    triggers: BTreeSet<(u32, u32)>,
    last_rebalance: Option<NaiveDate>,
}

impl RebalanceScheduler {
    pub fn new(triggers: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            triggers: triggers.into_iter().collect(),
            last_rebalance: None,
        }
    }

    pub fn triggers(&self) -> impl Iterator<Item = &(u32, u32)> {
        self.triggers.iter()
    }

    pub fn last_rebalance(&self) -> Option<NaiveDate> {
        self.last_rebalance
    }

    /// Whether `date` is a trigger date, ignoring what already fired.
    pub fn is_trigger_date(&self, date: NaiveDate) -> bool {
        let prior = date - Duration::days(1);
        self.triggers.contains(&(prior.month(), prior.day()))
    }

    /// Returns true at most once per distinct date; the first call on a
    /// trigger date records it.
    pub fn check(&mut self, date: NaiveDate) -> bool {
        if self.last_rebalance == Some(date) || !self.is_trigger_date(date) {
            return false;
        }
        self.last_rebalance = Some(date);
        true
    }
}

impl Default for RebalanceScheduler {
    fn default() -> Self {
        RebalanceScheduler::new(DEFAULT_TRIGGERS)
    }
}

/// Parse a comma list of `MM-DD` pairs, e.g. `01-31,07-15`.
pub fn parse_triggers(input: &str) -> Result<Vec<(u32, u32)>, String> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            let (m, d) = token
                .split_once('-')
                .ok_or_else(|| format!("expected MM-DD, got '{}'", token))?;
            let month: u32 = m.parse().map_err(|_| format!("invalid month in '{}'", token))?;
            let day: u32 = d.parse().map_err(|_| format!("invalid day in '{}'", token))?;
            // 2000 is a leap year, so 02-29 is accepted
            NaiveDate::from_ymd_opt(2000, month, day)
                .ok_or_else(|| format!("no such calendar day '{}'", token))?;
            Ok((month, day))
        })
        .collect()
}
