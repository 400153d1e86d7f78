//! Instrument universe: code list parsing and data validation.
//!
//! Codes come from configuration (or the data port's listing) and are
//! checked for enough bars before a replay. Codes without usable data are
//! skipped with a warning; only an empty result is an error.

use crate::domain::code_data::CodeData;
use crate::domain::error::FactorsigError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("all codes failed validation")]
    AllCodesFailed,
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

/// Loaded instruments in the order they were requested.
#[derive(Debug, Clone)]
pub struct Universe {
    pub instruments: Vec<CodeData>,
    pub skipped: Vec<SkippedCode>,
}

impl Universe {
    pub fn codes(&self) -> Vec<String> {
        self.instruments.iter().map(|cd| cd.code.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.instruments.len()
    }
}

/// Fetches every code over the date range and keeps those with at least
/// `minimum_bars` bars.
pub fn load_universe(
    data_port: &dyn DataPort,
    codes: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    minimum_bars: usize,
) -> Result<Universe, FactorsigError> {
    let requested = codes.len();
    let mut instruments = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let bars = match data_port.fetch_bars(&code, start_date, end_date) {
            Ok(bars) if !bars.is_empty() => bars,
            Ok(_) => {
                warn!(%code, "skipping, no data in range");
                skipped.push(SkippedCode {
                    code,
                    reason: SkipReason::NoData,
                });
                continue;
            }
            Err(e) => {
                warn!(%code, error = %e, "skipping, data unavailable");
                skipped.push(SkippedCode {
                    code,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.len() < minimum_bars {
            warn!(%code, bars = bars.len(), minimum = minimum_bars, "skipping, too few bars");
            skipped.push(SkippedCode {
                code,
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        info!(%code, bars = bars.len(), "loaded");
        instruments.push(CodeData::new(code, bars));
    }

    if instruments.is_empty() {
        return Err(UniverseError::AllCodesFailed.into());
    }
    if !skipped.is_empty() {
        info!(
            loaded = instruments.len(),
            requested, "universe reduced by skipped codes"
        );
    }

    Ok(Universe {
        instruments,
        skipped,
    })
}
